use crate::agent::translator::translate;
use crate::agent::validator::{validate_sql, ValidationPolicy};
use crate::context::AppContext;
use crate::db::{run_sql, QueryResult};
use crate::error::{Nl2SqlError, Result};
use serde::Serialize;

/// what the user sees after one submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    /// formatted sql, absent when translation failed
    pub sql: Option<String>,
    pub result: QueryResult,
    pub translation_available: bool,
}

impl PipelineOutcome {
    fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self {
            sql: None,
            result: QueryResult::error(format!("translation unavailable: {}", reason)),
            translation_available: false,
        }
    }
}

/// translate and sanitize without executing
pub async fn generate_sql(ctx: &AppContext, question: &str) -> Result<String> {
    if question.trim().is_empty() {
        return Err(Nl2SqlError::Translation("question is empty".to_string()));
    }

    let translation = translate(ctx.llm.as_ref(), &ctx.schema_prompt, question).await?;
    if translation.raw.trim() != translation.sql {
        tracing::debug!(raw = %translation.raw, "model reply rewritten by sanitizer");
    }
    Ok(translation.sql)
}

/// full pipeline: question -> sql -> (validate) -> execute
#[tracing::instrument(skip(ctx, question), fields(question_len = question.len()))]
pub async fn nl_to_sql_and_run(ctx: &AppContext, question: &str) -> PipelineOutcome {
    let sql = match generate_sql(ctx, question).await {
        Ok(sql) => sql,
        Err(Nl2SqlError::Translation(reason)) => {
            tracing::warn!("translation failed: {}", reason);
            return PipelineOutcome::unavailable(reason);
        }
        Err(e) => {
            tracing::warn!("translation failed: {}", e);
            return PipelineOutcome::unavailable(e);
        }
    };

    if ctx.policy == ValidationPolicy::AllowList {
        if let Err(e) = validate_sql(&sql, &ctx.identifiers) {
            return PipelineOutcome {
                sql: Some(sql),
                result: QueryResult::error(format!("Invalid SQL: {}", e)),
                translation_available: true,
            };
        }
    }

    let result = run_sql(ctx.db.as_ref(), &sql).await;

    PipelineOutcome {
        sql: Some(sql),
        result,
        translation_available: true,
    }
}
