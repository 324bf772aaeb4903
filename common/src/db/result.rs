use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ERROR_COLUMN: &str = "Error";

/// rows and column names of an executed statement, or a surfaced error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub is_error: bool,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            is_error: false,
        }
    }

    /// single `Error` column with one row carrying the message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            columns: vec![ERROR_COLUMN.to_string()],
            rows: vec![vec![Value::String(message.into())]],
            is_error: true,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error {
            return None;
        }
        self.rows.first()?.first()?.as_str()
    }

    /// rows as column-name to value maps
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// plain-text grid for terminal output
    pub fn to_text_table(&self) -> String {
        if self.columns.is_empty() {
            return format!("({} rows)\n", self.rows.len());
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(display_value).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        let border = format!("+{}+\n", border);

        let line = |values: &[String]| {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let value = values.get(i).map(String::as_str).unwrap_or("");
                    format!(" {}{} ", value, " ".repeat(w - value.chars().count()))
                })
                .collect();
            format!("|{}|\n", padded.join("|"))
        };

        let mut out = border.clone();
        out.push_str(&line(&self.columns));
        out.push_str(&border);
        for row in &cells {
            out.push_str(&line(row));
        }
        out.push_str(&border);
        out.push_str(&format!(
            "({} {})\n",
            self.rows.len(),
            if self.rows.len() == 1 { "row" } else { "rows" }
        ));
        out
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.replace('\n', " "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_result_shape() {
        let result = QueryResult::error("table 'shop.nope' doesn't exist");
        assert_eq!(result.columns, vec!["Error"]);
        assert_eq!(result.row_count(), 1);
        assert!(result.is_error);
        assert_eq!(result.error_message(), Some("table 'shop.nope' doesn't exist"));
    }

    #[test]
    fn test_records_map_columns_to_values() {
        let result = QueryResult::new(
            vec!["name".to_string(), "price".to_string()],
            vec![vec![json!("Laptop"), json!(1200.5)]],
        );

        let records = result.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], json!("Laptop"));
        assert_eq!(records[0]["price"], json!(1200.5));
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn test_serializes_with_error_flag() {
        let value = serde_json::to_value(QueryResult::error("boom")).unwrap();
        assert_eq!(
            value,
            json!({"columns": ["Error"], "rows": [["boom"]], "is_error": true})
        );
    }

    #[test]
    fn test_text_table() {
        let result = QueryResult::new(
            vec!["id".to_string(), "name".to_string()],
            vec![vec![json!(1), json!("Alice")], vec![json!(2), Value::Null]],
        );

        let expected = "+----+-------+\n\
                        | id | name  |\n\
                        +----+-------+\n\
                        | 1  | Alice |\n\
                        | 2  | NULL  |\n\
                        +----+-------+\n\
                        (2 rows)\n";
        assert_eq!(result.to_text_table(), expected);
    }

    #[test]
    fn test_text_table_without_columns() {
        assert_eq!(QueryResult::default().to_text_table(), "(0 rows)\n");
    }
}
