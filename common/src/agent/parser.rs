use crate::agent::formatter::format_sql;
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)```(?:sql)?").unwrap()
});

/// remove markdown code fences (with or without a `sql` tag) and surrounding whitespace
pub fn strip_code_fences(text: &str) -> String {
    FENCE_REGEX.replace_all(text.trim(), "").trim().to_string()
}

/// turn raw model output into a single formatted sql statement
#[tracing::instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn sanitize_sql(raw: &str) -> String {
    let sql = strip_code_fences(raw);
    let formatted = format_sql(&sql);

    tracing::debug!(sql_len = formatted.len(), "sanitized model output");
    formatted
}
