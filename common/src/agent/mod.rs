pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod translator;
pub mod validator;

pub use formatter::{format_sql, try_format_sql};
pub use parser::{sanitize_sql, strip_code_fences};
pub use pipeline::{generate_sql, nl_to_sql_and_run, PipelineOutcome};
pub use prompt::{build_system_prompt, build_user_prompt, schema_to_prompt, SchemaPrompt, SQL_SYSTEM_PROMPT};
pub use translator::{translate, Translation};
pub use validator::{validate_sql, ValidationPolicy};
