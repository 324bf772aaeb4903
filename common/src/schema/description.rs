use crate::error::{Nl2SqlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub table_name: String,
    pub columns: Vec<ColumnDescription>,
}

/// a foreign-key edge, both ends written as `table.column`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
}

/// static description of the target database, used to ground prompts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub db_id: String,
    pub tables: Vec<TableDescription>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// lowercased table and column names known to the schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaIdentifiers {
    pub tables: BTreeSet<String>,
    pub columns: BTreeSet<String>,
}

impl SchemaIdentifiers {
    pub fn contains(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.tables.contains(&lowered) || self.columns.contains(&lowered)
    }

    pub fn is_table(&self, name: &str) -> bool {
        self.tables.contains(&name.to_lowercase())
    }
}

impl SchemaDescription {
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let schema = Self::from_json_str(&text)?;

        tracing::info!(
            db_id = %schema.db_id,
            tables = schema.tables.len(),
            foreign_keys = schema.foreign_keys.len(),
            "loaded schema description"
        );

        Ok(schema)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let schema: SchemaDescription = serde_json::from_str(text)?;

        if schema.tables.is_empty() {
            return Err(Nl2SqlError::Schema(format!(
                "schema '{}' declares no tables",
                schema.db_id
            )));
        }

        if let Some(table) = schema.tables.iter().find(|t| t.table_name.trim().is_empty()) {
            return Err(Nl2SqlError::Schema(format!(
                "table with {} columns has an empty name",
                table.columns.len()
            )));
        }

        Ok(schema)
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    pub fn identifiers(&self) -> SchemaIdentifiers {
        let mut identifiers = SchemaIdentifiers::default();

        for table in &self.tables {
            identifiers.tables.insert(table.table_name.to_lowercase());
            for column in &table.columns {
                identifiers.columns.insert(column.column_name.to_lowercase());
            }
        }

        identifiers
    }
}
