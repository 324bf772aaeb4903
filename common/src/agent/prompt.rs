use crate::schema::SchemaDescription;
use std::fmt::Write;
use std::sync::Arc;

pub const SQL_SYSTEM_PROMPT: &str = "You are a helpful assistant that converts English questions \
     into SQL queries. Only output the SQL query, no explanation, no new lines.";

/// render the schema as the fixed-format block embedded in the system prompt
pub fn schema_to_prompt(schema: &SchemaDescription) -> String {
    let mut msg = String::new();

    // writing into a String cannot fail
    let _ = writeln!(msg, "Database ID: {}", schema.db_id);
    msg.push_str("Tables and Columns:\n");
    for table in &schema.tables {
        let _ = writeln!(msg, "- {}:", table.table_name);
        for col in &table.columns {
            let pk = if col.is_primary { " (PK)" } else { "" };
            let _ = writeln!(msg, "    - {} {}{}", col.column_name, col.data_type, pk);
        }
    }

    msg.push_str("\nForeign Keys:\n");
    for fk in &schema.foreign_keys {
        let _ = writeln!(msg, "  - {} -> {}", fk.column, fk.references);
    }

    msg
}

/// schema prompt computed once at startup and shared by every request
#[derive(Debug, Clone)]
pub struct SchemaPrompt(Arc<str>);

impl SchemaPrompt {
    pub fn new(schema: &SchemaDescription) -> Self {
        Self(Arc::from(schema_to_prompt(schema)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SchemaPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn build_system_prompt(schema_prompt: &SchemaPrompt) -> String {
    format!(
        "{}\n\nHere is the database schema:\n{}",
        SQL_SYSTEM_PROMPT, schema_prompt
    )
}

pub fn build_user_prompt(question: &str) -> String {
    format!("Translate into SQL: {}", question.trim())
}
