pub mod backend;
pub mod result;

pub use backend::{connect, connect_mysql, redact_url, MySqlBackend, QueryBackend, SqliteBackend};
pub use result::{QueryResult, ERROR_COLUMN};

use crate::agent::lexer::tokenize;
use sqlparser::tokenizer::Token;

/// number of non-empty statements separated by top-level `;`
///
/// `None` when the text does not tokenize; the database then reports the error itself.
pub fn statement_count(sql: &str) -> Option<usize> {
    let tokens = tokenize(sql).ok()?;
    let count = tokens
        .split(|t| matches!(t, Token::SemiColon))
        .filter(|statement| !statement.is_empty())
        .count();
    Some(count)
}

/// execute a single statement, surfacing any failure as a one-row `Error` table
#[tracing::instrument(skip(backend, sql), fields(backend = backend.name(), sql_len = sql.len()))]
pub async fn run_sql(backend: &dyn QueryBackend, sql: &str) -> QueryResult {
    if let Some(count) = statement_count(sql).filter(|n| *n > 1) {
        tracing::warn!(statements = count, "refusing to run more than one statement");
        return QueryResult::error(format!(
            "only one SQL statement can be run at a time (got {})",
            count
        ));
    }

    match backend.fetch(sql).await {
        Ok(result) => {
            tracing::info!(
                rows = result.row_count(),
                columns = result.columns.len(),
                "query executed"
            );
            result
        }
        Err(e) => {
            tracing::warn!("query failed: {}", e);
            QueryResult::error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn backend_with_two_rows() -> std::sync::Arc<dyn QueryBackend> {
        let backend = connect("sqlite::memory:", None).await.unwrap();
        backend
            .fetch(
                "CREATE TABLE customers (customer_id INTEGER PRIMARY KEY, first_name TEXT, email TEXT);
                 INSERT INTO customers VALUES (1, 'Alice', 'alice@example.com'), (2, 'Bob', 'bob@example.com');",
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_run_sql_unknown_table_becomes_error_row() {
        let backend = backend_with_two_rows().await;
        let result = run_sql(backend.as_ref(), "SELECT * FROM nope").await;

        assert!(result.is_error);
        assert_eq!(result.columns, vec![ERROR_COLUMN]);
        assert_eq!(result.row_count(), 1);
        assert!(result.error_message().unwrap().contains("no such table: nope"));
    }

    #[tokio::test]
    async fn test_run_sql_syntax_error_becomes_error_row() {
        let backend = backend_with_two_rows().await;
        let result = run_sql(backend.as_ref(), "SELEC first_name FROM customers").await;

        assert!(result.is_error);
        assert!(result.error_message().unwrap().contains("syntax error"));
    }

    #[tokio::test]
    async fn test_run_sql_two_rows() {
        let backend = backend_with_two_rows().await;
        let result = run_sql(
            backend.as_ref(),
            "SELECT first_name, email FROM customers ORDER BY customer_id",
        )
        .await;

        assert!(!result.is_error);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.columns, vec!["first_name", "email"]);
        assert_eq!(result.records()[1]["first_name"], json!("Bob"));
    }

    #[tokio::test]
    async fn test_run_sql_refuses_second_statement() {
        let backend = backend_with_two_rows().await;
        let result = run_sql(backend.as_ref(), "SELECT 1 AS x; DROP TABLE customers").await;

        assert!(result.is_error);
        assert_eq!(
            result.error_message(),
            Some("only one SQL statement can be run at a time (got 2)")
        );

        let still_there = run_sql(backend.as_ref(), "SELECT COUNT(*) AS n FROM customers").await;
        assert!(!still_there.is_error);
        assert_eq!(still_there.rows[0][0], json!(2));
    }

    #[tokio::test]
    async fn test_run_sql_allows_trailing_semicolon() {
        let backend = backend_with_two_rows().await;
        let result = run_sql(backend.as_ref(), "SELECT first_name FROM customers WHERE email = 'a;b';").await;

        assert!(!result.is_error);
        assert_eq!(result.row_count(), 0);
        assert_eq!(result.columns, vec!["first_name"]);
    }

    #[test]
    fn test_statement_count() {
        assert_eq!(statement_count("SELECT 1"), Some(1));
        assert_eq!(statement_count("SELECT 1;;"), Some(1));
        assert_eq!(statement_count("SELECT ';'"), Some(1));
        assert_eq!(statement_count("SELECT 1; DELETE FROM t"), Some(2));
        assert_eq!(statement_count(""), Some(0));
        assert_eq!(statement_count("SELECT 'open"), None);
    }
}
