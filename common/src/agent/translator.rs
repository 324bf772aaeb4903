use crate::agent::parser::sanitize_sql;
use crate::agent::prompt::{build_system_prompt, build_user_prompt, SchemaPrompt};
use crate::error::Result;
use crate::llm::{LlmProvider, Message};

/// model output for one question, before and after sanitization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub raw: String,
    pub sql: String,
}

pub fn build_messages(schema_prompt: &SchemaPrompt, question: &str) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(schema_prompt)),
        Message::user(build_user_prompt(question)),
    ]
}

/// ask the model for sql answering `question`; no retry on failure
#[tracing::instrument(skip(llm, schema_prompt, question), fields(llm = llm.name(), question_len = question.len()))]
pub async fn translate(
    llm: &dyn LlmProvider,
    schema_prompt: &SchemaPrompt,
    question: &str,
) -> Result<Translation> {
    let messages = build_messages(schema_prompt, question);

    let raw = llm.complete(messages).await?;
    let sql = sanitize_sql(&raw);

    tracing::info!(sql_len = sql.len(), "question translated");
    Ok(Translation { raw, sql })
}
