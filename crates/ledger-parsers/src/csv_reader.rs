//! CSV reader for the bank-statement exports that arrive as plain CSV
//! rather than Excel (most Indian net-banking "download statement"
//! exports land in this shape). Mirrors [`crate::tabular::Workbook`]'s
//! contract: read the raw grid, then map a chosen header row onto the
//! rows that follow.

use std::fs::File;
use std::path::Path;

use ledger_domain::{LedgerError, LedgerResult};

use crate::row::Row;

/// Reads every row of `path` as a raw string grid, with no header
/// assumption — the caller locates the header row itself (bank CSVs
/// often carry a few banner lines before the real header).
pub fn read_raw_rows(path: &Path) -> LedgerResult<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|e| LedgerError::invalid(format!("failed to open csv: {e}")))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(file);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LedgerError::invalid(format!("failed to read csv row: {e}")))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(rows)
}

/// Reads `path` treating row `header_at` as the header and every row
/// after it as data, the same contract as `Workbook::read_rows`.
pub fn read_rows(path: &Path, header_at: usize) -> LedgerResult<Vec<Row>> {
    let raw = read_raw_rows(path)?;
    if header_at >= raw.len() {
        return Ok(Vec::new());
    }
    let headers = &raw[header_at];
    let mut rows = Vec::new();
    for data_row in &raw[header_at + 1..] {
        let mut row = Row::new();
        for (idx, header) in headers.iter().enumerate() {
            if header.trim().is_empty() {
                continue;
            }
            if let Some(value) = data_row.get(idx) {
                row.insert(header, value.clone());
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_header_and_data_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Description,Amount").unwrap();
        writeln!(file, "2024-05-01,UPI/salary,50000").unwrap();
        let rows = read_rows(file.path(), 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_by_any(&["Amount"]), Some("50000"));
    }

    #[test]
    fn skips_banner_rows_before_the_real_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Statement for account XXXX1234").unwrap();
        writeln!(file, "Date,Description,Amount").unwrap();
        writeln!(file, "2024-05-01,UPI/salary,50000").unwrap();
        let rows = read_rows(file.path(), 1).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
