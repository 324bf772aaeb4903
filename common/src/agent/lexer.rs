use crate::error::{Nl2SqlError, Result};
use once_cell::sync::Lazy;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Word};
use std::collections::HashSet;

/// words rendered in upper case and never treated as schema identifiers
static SQL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE",
        "COLUMNS", "CREATE", "CROSS", "DATABASE", "DEFAULT", "DELETE", "DESC", "DESCRIBE",
        "DISTINCT", "DIV", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "EXPLAIN", "FALSE",
        "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IN", "INDEX", "INNER",
        "INSERT", "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN", "KEY", "LIKE", "LIMIT",
        "MOD", "NATURAL", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER",
        "OVER", "PARTITION", "PRIMARY", "RECURSIVE", "REFERENCES", "REGEXP",
        "ROLLUP", "SELECT", "SET", "SHOW", "TABLE", "TABLES", "THEN", "TRUE",
        "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHERE",
        "WITH", "XOR",
    ]
    .into_iter()
    .chain(FUNCTION_KEYWORDS.iter().copied())
    .collect()
});

/// keywords that can be called like functions, so no space goes before their `(`
static FUNCTION_KEYWORDS: &[&str] = &[
    "AVG", "CAST", "COALESCE", "COUNT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
    "DAY", "HOUR", "IF", "LEFT", "MAX", "MIN", "MINUTE", "MONTH", "QUARTER", "RIGHT", "SECOND",
    "SUM", "WEEK", "YEAR",
];

pub fn is_sql_keyword(word: &str) -> bool {
    SQL_KEYWORDS.contains(word.to_uppercase().as_str())
}

pub fn is_function_keyword(word: &str) -> bool {
    FUNCTION_KEYWORDS.contains(&word.to_uppercase().as_str())
}

/// unquoted word that is an sql keyword
pub fn keyword_of(token: &Token) -> Option<String> {
    match token {
        Token::Word(Word {
            value,
            quote_style: None,
            ..
        }) if is_sql_keyword(value) => Some(value.to_uppercase()),
        _ => None,
    }
}

/// tokenize with the mysql dialect, dropping whitespace and comments
///
/// string literals keep their escapes, so rendering a token gives back the source text
pub fn tokenize(sql: &str) -> Result<Vec<Token>> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .with_unescape(false)
        .tokenize()
        .map_err(|e| Nl2SqlError::Format(e.to_string()))?;

    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}
