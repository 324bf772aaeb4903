use thiserror::Error;

#[derive(Error, Debug)]
pub enum Nl2SqlError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("translation unavailable: {0}")]
    Translation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("references unknown table/column: {}", .0.join(", "))]
    UnknownIdentifier(Vec<String>),

    #[error("sql formatting failed: {0}")]
    Format(String),

    #[error("fixture export failed: {0}")]
    Fixture(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, Nl2SqlError>;
