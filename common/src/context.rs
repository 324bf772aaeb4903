use crate::agent::prompt::SchemaPrompt;
use crate::agent::validator::ValidationPolicy;
use crate::db::QueryBackend;
use crate::llm::LlmProvider;
use crate::schema::{SchemaDescription, SchemaIdentifiers};
use std::sync::Arc;

/// everything a request needs, built once at startup and shared read-only
#[derive(Clone)]
pub struct AppContext {
    pub schema: Arc<SchemaDescription>,
    pub schema_prompt: SchemaPrompt,
    pub identifiers: Arc<SchemaIdentifiers>,
    pub llm: Arc<dyn LlmProvider>,
    pub db: Arc<dyn QueryBackend>,
    pub policy: ValidationPolicy,
}

impl AppContext {
    pub fn new(
        schema: SchemaDescription,
        llm: Arc<dyn LlmProvider>,
        db: Arc<dyn QueryBackend>,
        policy: ValidationPolicy,
    ) -> Self {
        let schema_prompt = SchemaPrompt::new(&schema);
        let identifiers = Arc::new(schema.identifiers());

        tracing::info!(
            db_id = %schema.db_id,
            llm = llm.name(),
            backend = db.name(),
            policy = ?policy,
            prompt_len = schema_prompt.as_str().len(),
            "application context ready"
        );

        Self {
            schema: Arc::new(schema),
            schema_prompt,
            identifiers,
            llm,
            db,
            policy,
        }
    }
}
