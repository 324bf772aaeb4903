use crate::agent::lexer::{keyword_of, tokenize};
use crate::error::{Nl2SqlError, Result};
use crate::schema::SchemaIdentifiers;
use serde::{Deserialize, Serialize};
use sqlparser::tokenizer::{Token, Word};
use std::collections::BTreeSet;
use std::ops::Range;
use std::str::FromStr;

/// whether generated sql must only reference identifiers from the loaded schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    #[default]
    Disabled,
    AllowList,
}

impl FromStr for ValidationPolicy {
    type Err = Nl2SqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "0" | "false" | "no" | "off" | "disabled" => Ok(Self::Disabled),
            "1" | "true" | "yes" | "on" | "allow_list" | "strict" => Ok(Self::AllowList),
            other => Err(Nl2SqlError::Config(format!(
                "unknown identifier validation policy '{}'",
                other
            ))),
        }
    }
}

/// reject sql that names tables or columns the schema does not declare
///
/// keywords, function calls and literals are allowed. Aliases introduced by the
/// statement itself (`t.x` after `FROM t x` or `(...) x`, `ORDER BY total` after
/// `... AS total`) are allowed where they are used, but never excuse the
/// expression they name.
pub fn validate_sql(sql: &str, identifiers: &SchemaIdentifiers) -> Result<()> {
    let tokens = tokenize(sql)?;
    let aliases = Aliases::collect(&tokens, identifiers);

    let mut unknown = BTreeSet::new();
    for (i, token) in tokens.iter().enumerate() {
        let Some(name) = identifier(token) else {
            continue;
        };

        let is_call = matches!(tokens.get(i + 1), Some(Token::LParen));
        if is_call || identifiers.contains(&name) || aliases.excuses(&tokens, i, &name) {
            continue;
        }

        unknown.insert(name);
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        tracing::warn!(unknown = ?unknown, "generated sql references unknown identifiers");
        Err(Nl2SqlError::UnknownIdentifier(unknown.into_iter().collect()))
    }
}

fn identifier(token: &Token) -> Option<String> {
    match token {
        Token::Word(Word { value, .. }) if keyword_of(token).is_none() => Some(value.to_lowercase()),
        _ => None,
    }
}

/// a name bound to a select-list expression, and the tokens of that expression
struct ColumnAlias {
    name: String,
    expr: Range<usize>,
}

#[derive(Default)]
struct Aliases {
    /// positions where an alias is introduced
    introduced: BTreeSet<usize>,
    /// usable only as `alias.column`
    tables: BTreeSet<String>,
    columns: Vec<ColumnAlias>,
}

impl Aliases {
    fn collect(tokens: &[Token], identifiers: &SchemaIdentifiers) -> Self {
        let subquery_ends = subquery_ends(tokens);
        let names_relation = |idx: usize| match &tokens[idx] {
            Token::RParen => subquery_ends.contains(&idx),
            token => identifier(token).is_some_and(|name| identifiers.is_table(&name)),
        };

        let mut aliases = Self::default();
        for i in 1..tokens.len() {
            let Some(name) = identifier(&tokens[i]) else {
                continue;
            };
            let prev = i - 1;

            if keyword_of(&tokens[prev]).as_deref() == Some("AS") {
                if prev == 0 {
                    continue;
                }
                if names_relation(prev - 1) {
                    aliases.tables.insert(name);
                } else {
                    let start = expression_start(tokens, prev);
                    aliases.columns.push(ColumnAlias {
                        name,
                        expr: start..prev,
                    });
                }
                aliases.introduced.insert(i);
            } else if names_relation(prev) {
                aliases.tables.insert(name);
                aliases.introduced.insert(i);
            } else if matches!(tokens[prev], Token::RParen) {
                // `SUM(x) total`
                aliases.columns.push(ColumnAlias {
                    name,
                    expr: expression_start(tokens, i)..i,
                });
                aliases.introduced.insert(i);
            }
        }

        aliases
    }

    fn excuses(&self, tokens: &[Token], idx: usize, name: &str) -> bool {
        if self.introduced.contains(&idx) {
            return true;
        }

        let qualifies = matches!(tokens.get(idx + 1), Some(Token::Period));
        if qualifies && self.tables.contains(name) {
            return true;
        }

        self.columns
            .iter()
            .any(|alias| alias.name == name && !alias.expr.contains(&idx))
    }
}

/// positions of `)` closing a parenthesized `SELECT`
fn subquery_ends(tokens: &[Token]) -> BTreeSet<usize> {
    let mut open = Vec::new();
    let mut ends = BTreeSet::new();

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => {
                let is_select = tokens
                    .get(i + 1)
                    .and_then(keyword_of)
                    .is_some_and(|kw| kw == "SELECT");
                open.push(is_select);
            }
            Token::RParen => {
                if open.pop() == Some(true) {
                    ends.insert(i);
                }
            }
            _ => {}
        }
    }

    ends
}

/// first token of the select-list item that ends just before `end`
fn expression_start(tokens: &[Token], end: usize) -> usize {
    let mut depth = 0usize;

    for i in (0..end).rev() {
        match &tokens[i] {
            Token::RParen => depth += 1,
            Token::LParen if depth == 0 => return i + 1,
            Token::LParen => depth -= 1,
            Token::Comma if depth == 0 => return i + 1,
            token if depth == 0 && keyword_of(token).as_deref() == Some("SELECT") => return i + 1,
            _ => {}
        }
    }

    0
}
