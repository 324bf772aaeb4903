use crate::error::Result;
use crate::fixtures::QueryPair;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: [&str; 2] = ["text_query", "sql_command"];

/// create or truncate `path` and write the header followed by `pairs`
pub fn write_pairs(path: &Path, pairs: &[QueryPair]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    write_record(&mut out, &CSV_HEADER)?;
    write_all(&mut out, pairs)
}

/// append `pairs` to `path` without a header, creating the file if needed
pub fn append_pairs(path: &Path, pairs: &[QueryPair]) -> Result<usize> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut out = BufWriter::new(file);
    write_all(&mut out, pairs)
}

fn write_all(out: &mut impl Write, pairs: &[QueryPair]) -> Result<usize> {
    for pair in pairs {
        write_record(out, &[pair.text_query.as_str(), pair.sql_command.as_str()])?;
    }
    out.flush()?;
    Ok(pairs.len())
}

fn write_record(out: &mut impl Write, fields: &[&str]) -> Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", line)?;
    Ok(())
}

/// quote fields holding a delimiter, quote or line break; double embedded quotes
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// minimal reader for files produced by this module
#[cfg(test)]
pub(crate) fn read_records(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if field.is_empty() => quoted = true,
            (',', false) => record.push(std::mem::take(&mut field)),
            ('\n', false) => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            (c, _) => field.push(c),
        }
    }

    Ok(records)
}
