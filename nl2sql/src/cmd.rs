use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::agent::{build_system_prompt, nl_to_sql_and_run, ValidationPolicy};
use common::config::{self, DatabaseConfig, DEFAULT_BIND, DEFAULT_SCHEMA_PATH};
use common::context::AppContext;
use common::fixtures::{export_catalogue, QueryCatalogue, DEFAULT_OUTPUT};
use common::llm::GroqClient;
use common::schema::SchemaDescription;
use common::tracing::init_tracing;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "translate english questions into sql and run them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the question form and JSON API
    Serve {
        #[command(flatten)]
        app: AppArgs,

        /// Address to listen on
        #[arg(long, env = "NL2SQL_BIND", default_value = DEFAULT_BIND)]
        bind: String,
    },
    /// Answer a single question from the command line
    Ask {
        #[command(flatten)]
        app: AppArgs,

        /// Question in English
        question: String,

        /// Output format for the result table
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print the system prompt built from the schema description
    Prompt {
        /// Schema description JSON file
        #[arg(long, env = "NL2SQL_SCHEMA_PATH", default_value = DEFAULT_SCHEMA_PATH)]
        schema: PathBuf,
    },
    /// Question/SQL example pairs
    Fixtures {
        #[command(subcommand)]
        subcommand: FixtureCommands,
    },
}

#[derive(Subcommand)]
enum FixtureCommands {
    /// Write the example pairs to a CSV file
    Export {
        /// Catalogue JSON file (default: the bundled catalogue)
        #[arg(long)]
        catalogue: Option<PathBuf>,

        /// Output CSV file path
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct AppArgs {
    /// Schema description JSON file
    #[arg(long, env = "NL2SQL_SCHEMA_PATH", default_value = DEFAULT_SCHEMA_PATH)]
    schema: PathBuf,

    /// Database connection URL (mysql:// or sqlite:)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// API key for the text-generation service
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat model name
    #[arg(long, env = "NL2SQL_MODEL")]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "NL2SQL_LLM_BASE_URL")]
    base_url: Option<String>,

    /// Request timeout for the text-generation service
    #[arg(long, env = "NL2SQL_LLM_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Sampling temperature (service default when unset)
    #[arg(long, env = "NL2SQL_LLM_TEMPERATURE")]
    temperature: Option<f32>,

    /// Upper bound on generated tokens (service default when unset)
    #[arg(long, env = "NL2SQL_LLM_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// Reject SQL that references tables or columns outside the schema
    /// (true/false, or allow_list/disabled)
    #[arg(
        long = "strict-identifiers",
        env = "NL2SQL_STRICT_IDENTIFIERS",
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    policy: ValidationPolicy,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = init_tracing("nl2sql")?;

        match self.command {
            Commands::Serve { app, bind } => {
                let ctx = build_context(app).await?;
                common::web::serve(ctx, &bind).await?;
                Ok(())
            }
            Commands::Ask {
                app,
                question,
                format,
            } => {
                let ctx = build_context(app).await?;
                ask(&ctx, &question, format).await
            }
            Commands::Prompt { schema } => {
                let schema = SchemaDescription::from_path(&schema)
                    .with_context(|| format!("loading schema from {}", schema.display()))?;
                let prompt = common::agent::SchemaPrompt::new(&schema);
                println!("{}", build_system_prompt(&prompt));
                Ok(())
            }
            Commands::Fixtures { subcommand } => match subcommand {
                FixtureCommands::Export { catalogue, output } => export_fixtures(catalogue, output),
            },
        }
    }
}

async fn build_context(args: AppArgs) -> Result<AppContext> {
    let schema = SchemaDescription::from_path(&args.schema)
        .with_context(|| format!("loading schema from {}", args.schema.display()))?;
    tracing::info!(
        "loaded schema '{}' ({} tables, {} columns)",
        schema.db_id,
        schema.tables.len(),
        schema.column_count()
    );

    let model = config::model_config(args.api_key, args.model, args.base_url, args.timeout_secs)?
        .with_temperature(args.temperature)
        .with_max_tokens(args.max_tokens);
    let llm = GroqClient::new(model)?;

    let database = DatabaseConfig::resolve(args.database_url)?;
    tracing::debug!("database: {:?}", database);
    let db = database.connect(None).await?;

    Ok(AppContext::new(schema, Arc::new(llm), db, args.policy))
}

async fn ask(ctx: &AppContext, question: &str, format: OutputFormat) -> Result<()> {
    let outcome = nl_to_sql_and_run(ctx, question).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Table => {
            if let Some(sql) = &outcome.sql {
                println!("{}\n", sql);
            }
            println!("{}", outcome.result.to_text_table());
        }
    }

    Ok(())
}

fn export_fixtures(catalogue: Option<PathBuf>, output: PathBuf) -> Result<()> {
    let catalogue = match catalogue {
        Some(path) => QueryCatalogue::from_path(&path)
            .with_context(|| format!("loading catalogue from {}", path.display()))?,
        None => QueryCatalogue::bundled()?,
    };

    let summary = export_catalogue(&catalogue, &output)?;
    println!(
        "wrote {} examples and added {} new examples to {}",
        summary.written,
        summary.appended,
        output.display()
    );
    Ok(())
}
