use crate::agent::lexer::{is_function_keyword, is_sql_keyword, keyword_of, tokenize};
use crate::error::Result;
use sqlparser::tokenizer::{Token, Word};

const INDENT: &str = "  ";

/// keywords that open a new line when they appear outside parentheses
const CLAUSE_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "ORDER", "HAVING", "LIMIT", "UNION", "INTERSECT",
    "EXCEPT", "SET", "VALUES",
];

const JOIN_MODIFIERS: &[&str] = &["LEFT", "RIGHT", "INNER", "FULL", "CROSS", "NATURAL", "OUTER"];

/// pretty-print a statement, returning the trimmed input when it cannot be tokenized
pub fn format_sql(sql: &str) -> String {
    match try_format_sql(sql) {
        Ok(formatted) => formatted,
        Err(e) => {
            tracing::warn!("leaving sql unformatted: {}", e);
            sql.trim().to_string()
        }
    }
}

/// upper-case keywords, lower-case identifiers and break top-level clauses onto their own lines
pub fn try_format_sql(sql: &str) -> Result<String> {
    let tokens = tokenize(sql)?;

    let mut out = String::with_capacity(sql.len() + 16);
    let mut prev: Option<&Token> = None;
    let mut clause = String::new();
    let mut depth = 0usize;
    let mut pending_between = false;
    let mut line_start = true;

    for (i, token) in tokens.iter().enumerate() {
        let keyword = keyword_of(token);
        let next_is_paren = matches!(tokens.get(i + 1), Some(Token::LParen));
        let prev_keyword = prev.and_then(keyword_of);

        if depth == 0 && i > 0 {
            if let Some(kw) = keyword.as_deref() {
                if breaks_line(kw, prev_keyword.as_deref(), next_is_paren) {
                    newline(&mut out, &mut line_start);
                } else if (kw == "AND" || kw == "OR")
                    && (clause == "WHERE" || clause == "HAVING")
                    && !pending_between
                {
                    newline(&mut out, &mut line_start);
                    out.push_str(INDENT);
                }
            }
        }

        if !line_start && needs_space(prev, token) {
            out.push(' ');
        }
        out.push_str(&render(token));
        line_start = false;

        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 && clause == "SELECT" => {
                newline(&mut out, &mut line_start);
                out.push_str(INDENT);
            }
            _ => {}
        }

        if let Some(kw) = keyword {
            match kw.as_str() {
                "BETWEEN" => pending_between = true,
                "AND" if pending_between => pending_between = false,
                _ => {}
            }
            if depth == 0 && CLAUSE_KEYWORDS.contains(&kw.as_str()) {
                clause = kw;
            }
        }

        prev = Some(token);
    }

    Ok(out.trim_end().to_string())
}

fn breaks_line(keyword: &str, prev_keyword: Option<&str>, next_is_paren: bool) -> bool {
    let after_modifier = prev_keyword.is_some_and(|p| JOIN_MODIFIERS.contains(&p));

    match keyword {
        // `SELECT` directly after `UNION ALL`/`UNION` still starts a new line
        "SELECT" => true,
        "JOIN" => !after_modifier,
        "OUTER" => false,
        // `LEFT(...)` and `RIGHT(...)` are string functions
        kw if JOIN_MODIFIERS.contains(&kw) => !after_modifier && !next_is_paren,
        kw => CLAUSE_KEYWORDS.contains(&kw),
    }
}

fn newline(out: &mut String, line_start: &mut bool) {
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
    *line_start = true;
}

fn needs_space(prev: Option<&Token>, next: &Token) -> bool {
    let Some(prev) = prev else {
        return false;
    };

    if matches!(
        next,
        Token::Comma | Token::RParen | Token::Period | Token::SemiColon
    ) {
        return false;
    }

    if matches!(prev, Token::LParen | Token::Period) {
        return false;
    }

    if let (Token::Word(word), Token::LParen) = (prev, next) {
        // function call
        return word.quote_style.is_none()
            && is_sql_keyword(&word.value)
            && !is_function_keyword(&word.value);
    }

    true
}

fn render(token: &Token) -> String {
    match token {
        Token::Word(Word {
            value,
            quote_style: None,
            ..
        }) => {
            if is_sql_keyword(value) {
                value.to_uppercase()
            } else {
                value.to_lowercase()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::MySqlDialect;
    use sqlparser::parser::Parser;

    fn reparses(sql: &str) -> bool {
        Parser::parse_sql(&MySqlDialect {}, sql).is_ok()
    }

    #[test]
    fn test_format_simple_select() {
        let sql = try_format_sql("select name,price from products where price>500").unwrap();
        assert_eq!(sql, "SELECT name,\n  price\nFROM products\nWHERE price > 500");
        assert!(reparses(&sql));
    }

    #[test]
    fn test_identifiers_are_lowercased() {
        let sql = try_format_sql("SELECT First_Name FROM Customers WHERE Email = 'A@B.COM'").unwrap();
        assert_eq!(sql, "SELECT first_name\nFROM customers\nWHERE email = 'A@B.COM'");
    }

    #[test]
    fn test_quoted_identifiers_are_preserved() {
        let sql = try_format_sql("select `Order Total` from `Orders`").unwrap();
        assert_eq!(sql, "SELECT `Order Total`\nFROM `Orders`");
    }

    #[test]
    fn test_joins_and_conditions() {
        let sql = try_format_sql(
            "select c.first_name, o.status from customers c left join orders o on c.customer_id = o.customer_id \
             where o.status = 'Delivered' and o.order_date like '2025-09%' order by c.first_name desc limit 5",
        )
        .unwrap();

        let expected = "SELECT c.first_name,\n  o.status\n\
                        FROM customers c\n\
                        LEFT JOIN orders o ON c.customer_id = o.customer_id\n\
                        WHERE o.status = 'Delivered'\n  AND o.order_date LIKE '2025-09%'\n\
                        ORDER BY c.first_name DESC\n\
                        LIMIT 5";
        assert_eq!(sql, expected);
        assert!(reparses(&sql));
    }

    #[test]
    fn test_between_keeps_its_and() {
        let sql = try_format_sql("select * from t where a between 1 and 5 and b = 2").unwrap();
        assert_eq!(sql, "SELECT *\nFROM t\nWHERE a BETWEEN 1 AND 5\n  AND b = 2");
    }

    #[test]
    fn test_subquery_stays_inline() {
        let sql = try_format_sql(
            "select category, name from products p1 where price = (select max(p2.price) from products p2 where p2.category = p1.category)",
        )
        .unwrap();

        assert_eq!(sql.lines().count(), 4);
        assert!(sql.contains("(SELECT MAX(p2.price) FROM products p2 WHERE p2.category = p1.category)"));
        assert!(reparses(&sql));
    }

    #[test]
    fn test_aggregate_spacing() {
        let sql = try_format_sql("select count(*) as n, sum(quantity) from order_items group by order_id having count(*) > 1").unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS n,\n  SUM(quantity)\nFROM order_items\nGROUP BY order_id\nHAVING COUNT(*) > 1"
        );
        assert!(reparses(&sql));
    }

    #[test]
    fn test_in_list_and_functions() {
        let sql = try_format_sql("select round(price, 2) from products where category in ('A','B')").unwrap();
        assert_eq!(
            sql,
            "SELECT round(price, 2)\nFROM products\nWHERE category IN ('A', 'B')"
        );
    }

    #[test]
    fn test_left_string_function_is_not_a_join() {
        let sql = try_format_sql("select left(name, 3) from products").unwrap();
        assert_eq!(sql, "SELECT LEFT(name, 3)\nFROM products");
    }

    #[test]
    fn test_union_and_trailing_semicolon() {
        let sql = try_format_sql("select a from t union all select a from u;").unwrap();
        assert_eq!(sql, "SELECT a\nFROM t\nUNION ALL\nSELECT a\nFROM u;");
    }

    #[test]
    fn test_update_statement() {
        let sql = try_format_sql("update products set price = 10 where product_id = 1").unwrap();
        assert_eq!(sql, "UPDATE products\nSET price = 10\nWHERE product_id = 1");
        assert!(reparses(&sql));
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let inputs = [
            "select name,price from products where price>500",
            "SELECT c.first_name, SUM(oi.quantity * p.price) AS total_spent FROM customers c JOIN orders o ON c.customer_id = o.customer_id JOIN order_items oi ON o.order_id = oi.order_id JOIN products p ON oi.product_id = p.product_id GROUP BY c.customer_id ORDER BY total_spent DESC",
            "select avg(total_items) from (select order_id, sum(quantity) as total_items from order_items group by order_id) t",
            "select * from customers where last_name = 'O''Brien'",
            r"select name from products where name = 'It\'s' or category = 'a,b'",
            "select name -- pick the name\nfrom products /* every row */ where price > 1",
            "select 1; select name from products",
            "select * from orders where order_date > current_date - interval 30 day",
        ];

        for input in inputs {
            let once = try_format_sql(input).unwrap();
            let twice = try_format_sql(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {input}");
            assert!(reparses(&once), "does not reparse: {once}");
        }
    }

    #[test]
    fn test_string_literal_escapes_are_preserved() {
        let sql = try_format_sql("select * from customers where last_name = 'O''Brien'").unwrap();
        assert_eq!(sql, "SELECT *\nFROM customers\nWHERE last_name = 'O''Brien'");
        assert!(reparses(&sql));

        let sql = try_format_sql(r"select name from products where name = 'It\'s'").unwrap();
        assert_eq!(sql, "SELECT name\nFROM products\nWHERE name = 'It\\'s'");
        assert!(reparses(&sql));
    }

    #[test]
    fn test_comments_are_dropped() {
        let sql = try_format_sql("select name -- pick the name\nfrom products /* every row */").unwrap();
        assert_eq!(sql, "SELECT name\nFROM products");
    }

    #[test]
    fn test_each_statement_starts_a_line() {
        let sql = try_format_sql("select 1; select name from products").unwrap();
        assert_eq!(sql, "SELECT 1;\nSELECT name\nFROM products");
    }

    #[test]
    fn test_date_parts_are_uppercased() {
        let sql = try_format_sql("select year(order_date) from orders where order_date > current_date - interval 30 day").unwrap();
        assert_eq!(
            sql,
            "SELECT YEAR(order_date)\nFROM orders\nWHERE order_date > CURRENT_DATE - INTERVAL 30 DAY"
        );
    }

    #[test]
    fn test_format_falls_back_on_tokenizer_error() {
        assert_eq!(format_sql("  select 'unterminated  "), "select 'unterminated");
    }
}
