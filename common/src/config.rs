use crate::db::{self, QueryBackend};
use crate::error::{Nl2SqlError, Result};
use crate::llm::ModelConfig;
use std::env;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SCHEMA_PATH: &str = "data/schema.json";
pub const DEFAULT_BIND: &str = "127.0.0.1:7860";

/// load `.env` from the working directory if there is one
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env: {}", e),
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

pub fn env_flag(key: &str) -> bool {
    env_value(key)
        .map(|v| {
            let v = v.to_lowercase();
            v == "1" || v == "true" || v == "yes"
        })
        .unwrap_or(false)
}

/// where the relational database lives
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Url(String),
    MySql {
        host: String,
        port: Option<u16>,
        user: String,
        password: String,
        database: String,
    },
}

impl DatabaseConfig {
    /// explicit url, then `DATABASE_URL`, then the `DB_HOST`/`DB_USER`/`DB_PASSWORD`/`DB_NAME` set
    pub fn resolve(database_url: Option<String>) -> Result<Self> {
        if let Some(url) = database_url
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_value("DATABASE_URL"))
        {
            return Ok(Self::Url(url));
        }

        let required = |key: &str| {
            env_value(key).ok_or_else(|| {
                Nl2SqlError::Config(format!(
                    "{} is not set (set DATABASE_URL or DB_HOST, DB_USER, DB_PASSWORD, DB_NAME)",
                    key
                ))
            })
        };

        let port = env_value("DB_PORT")
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|e| Nl2SqlError::Config(format!("invalid DB_PORT '{}': {}", p, e)))
            })
            .transpose()?;

        Ok(Self::MySql {
            host: required("DB_HOST")?,
            port,
            user: required("DB_USER")?,
            password: env::var("DB_PASSWORD").unwrap_or_default(),
            database: required("DB_NAME")?,
        })
    }

    pub async fn connect(&self, max_connections: Option<u32>) -> Result<Arc<dyn QueryBackend>> {
        match self {
            Self::Url(url) => db::connect(url, max_connections).await,
            Self::MySql {
                host,
                port,
                user,
                password,
                database,
            } => {
                let mut options = sqlx::mysql::MySqlConnectOptions::new()
                    .host(host)
                    .username(user)
                    .password(password)
                    .database(database);
                if let Some(port) = port {
                    options = options.port(*port);
                }
                db::backend::connect_mysql(options, max_connections).await
            }
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(&db::redact_url(url)).finish(),
            Self::MySql {
                host,
                port,
                user,
                database,
                ..
            } => f
                .debug_struct("MySql")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("database", database)
                .finish_non_exhaustive(),
        }
    }
}

/// text-generation settings; the api key is required
pub fn model_config(
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<ModelConfig> {
    let api_key = api_key
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Nl2SqlError::Config("GROQ_API_KEY is not set".to_string()))?;

    let mut config = ModelConfig::new(api_key).with_timeout(timeout_secs.map(Duration::from_secs));
    if let Some(model) = model.filter(|s| !s.trim().is_empty()) {
        config = config.with_model(model);
    }
    if let Some(base_url) = base_url.filter(|s| !s.trim().is_empty()) {
        config = config.with_base_url(base_url);
    }

    Ok(config)
}
