//! Tabular preprocessing output.
//!
//! Every uploaded document becomes a [`ReportTable`]; a job's tables are
//! concatenated and served as CSV.

mod csv;
mod table;

pub use csv::{escape_csv, parse_records, CsvError};
pub use table::{ReportTable, REPORT_COLUMN};
