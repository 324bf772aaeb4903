//! example question/sql pairs and their csv export
//!
//! the catalogue is data, not code: it lives in `data/text2sql_pairs.json`
//! and is also embedded in the binary so the export works from any directory.

pub mod csv;

use crate::error::{Nl2SqlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use self::csv::{append_pairs, write_pairs, CSV_HEADER};

pub const DEFAULT_OUTPUT: &str = "synthetic_text2sql.csv";

const BUNDLED_CATALOGUE: &str = include_str!("../../../data/text2sql_pairs.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPair {
    pub text_query: String,
    pub sql_command: String,
}

/// two batches of pairs: `initial` is written with a header, `extra` appended after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCatalogue {
    pub initial: Vec<QueryPair>,
    #[serde(default)]
    pub extra: Vec<QueryPair>,
}

impl QueryCatalogue {
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CATALOGUE)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let catalogue: QueryCatalogue = serde_json::from_str(text)?;

        if let Some(pair) = catalogue
            .all()
            .find(|p| p.text_query.trim().is_empty() || p.sql_command.trim().is_empty())
        {
            return Err(Nl2SqlError::Fixture(format!(
                "catalogue entry has an empty field: {:?}",
                pair
            )));
        }

        Ok(catalogue)
    }

    pub fn all(&self) -> impl Iterator<Item = &QueryPair> {
        self.initial.iter().chain(self.extra.iter())
    }

    pub fn len(&self) -> usize {
        self.initial.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub appended: usize,
}

/// write the initial batch (truncating, with header) then append the extra batch
#[tracing::instrument(skip(catalogue, path), fields(path = %path.as_ref().display()))]
pub fn export_catalogue(catalogue: &QueryCatalogue, path: impl AsRef<Path>) -> Result<ExportSummary> {
    let path = path.as_ref();

    let written = write_pairs(path, &catalogue.initial)?;
    tracing::info!("wrote {} examples to {}", written, path.display());

    let appended = append_pairs(path, &catalogue.extra)?;
    tracing::info!("added {} new examples to {}", appended, path.display());

    Ok(ExportSummary { written, appended })
}
