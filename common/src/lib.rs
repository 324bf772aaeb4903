pub mod agent;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod llm;
pub mod schema;
pub mod tracing;
pub mod web;

pub use error::{Nl2SqlError, Result};
