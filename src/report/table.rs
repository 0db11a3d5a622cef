//! In-memory report table.

use std::collections::HashMap;

use super::csv::{escape_csv, parse_records, CsvError};

/// Column holding the text of a converted document.
pub const REPORT_COLUMN: &str = "report";

/// Ordered columns with rows of optional cells. `None` is a missing value
/// and is written as an empty CSV field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ReportTable {
    /// Single-row table holding one document's text.
    pub fn from_report(text: impl Into<String>) -> Self {
        Self {
            columns: vec![REPORT_COLUMN.to_string()],
            rows: vec![vec![Some(text.into())]],
        }
    }

    /// Parse CSV text; the first record is the header.
    pub fn from_csv(input: &str) -> Result<Self, CsvError> {
        let mut records = parse_records(input)?.into_iter();
        let (_, header) = records.next().ok_or(CsvError::Empty)?;
        let columns = dedupe_columns(header);
        let width = columns.len();

        let mut rows = Vec::new();
        for (line, record) in records {
            if record.len() > width {
                return Err(CsvError::TooManyFields {
                    line,
                    expected: width,
                    found: record.len(),
                });
            }
            let mut row: Vec<Option<String>> = record
                .into_iter()
                .map(|v| if v.is_empty() { None } else { Some(v) })
                .collect();
            row.resize(width, None);
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Stack tables vertically. Columns are the union in order of first
    /// appearance; cells a table does not have stay missing.
    pub fn concat(tables: impl IntoIterator<Item = ReportTable>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut rows = Vec::new();

        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .map(|name| {
                    *index.entry(name.clone()).or_insert_with(|| {
                        columns.push(name.clone());
                        columns.len() - 1
                    })
                })
                .collect();

            for row in table.rows {
                let mut out = vec![None; mapping.len().max(columns.len())];
                for (cell, &target) in row.into_iter().zip(&mapping) {
                    out[target] = cell;
                }
                rows.push(out);
            }
        }

        for row in &mut rows {
            row.resize(columns.len(), None);
        }

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as CSV: header line, then one line per row, no index column.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_line(&mut out, self.columns.iter().map(|c| escape_csv(c)));
        for row in &self.rows {
            push_line(
                &mut out,
                row.iter()
                    .map(|cell| cell.as_deref().map(escape_csv).unwrap_or_default()),
            );
        }
        out
    }
}

fn push_line(out: &mut String, fields: impl Iterator<Item = String>) {
    let line: Vec<String> = fields.collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// Name empty headers `Unnamed: <i>` and suffix repeats with `.1`, `.2`, ...
fn dedupe_columns(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(header.len());

    for (i, name) in header.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        while seen.contains_key(&candidate) {
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{}.{}", base, count);
        }
        seen.insert(candidate.clone(), 0);
        columns.push(candidate);
    }

    columns
}
