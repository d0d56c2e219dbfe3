//! Tabular reader abstraction over `calamine`, with the sheet/header
//! fallback-chain idiom the original CAMS/Zerodha readers use: try a
//! prioritized list of sheet names against a prioritized list of header
//! row offsets, keep the first combination whose row set validates.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use ledger_domain::{LedgerError, LedgerResult};

use crate::row::Row;

pub struct Workbook {
    sheets: calamine::Sheets<std::io::BufReader<std::fs::File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let sheets = open_workbook_auto(path).map_err(|e| LedgerError::invalid(format!("failed to open workbook: {e}")))?;
        Ok(Workbook { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names().to_vec()
    }

    /// Reads one sheet with the header taken from `header_at` (0-indexed)
    /// and every following row mapped against that header.
    pub fn read_rows(&mut self, sheet: &str, header_at: usize) -> LedgerResult<Vec<Row>> {
        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|e| LedgerError::invalid(format!("sheet {sheet} not found: {e}")))?;

        let mut rows_iter = range.rows().skip(header_at);
        let Some(header_row) = rows_iter.next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

        let mut rows = Vec::new();
        for data_row in rows_iter {
            let mut row = Row::new();
            for (idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                if let Some(cell) = data_row.get(idx) {
                    row.insert(header, cell_to_string(cell));
                }
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// One `(sheet, header_at)` combination to try, in priority order.
pub struct FallbackPlan<'a> {
    pub sheet_candidates: &'a [&'a str],
    pub header_row_candidates: &'a [usize],
}

/// Tries every `(sheet, header_row)` combination in `plan`, keeping the
/// first result for which `validate` returns `true` — the same
/// try-engines-then-try-sheets-then-try-headers loop the original CAMS
/// reader runs (`_read_excel_with_fallback`), minus the multi-engine
/// part since `calamine` already covers xls/xlsx/xlsb/ods in one crate.
pub fn read_with_fallback(
    path: &Path,
    plan: &FallbackPlan<'_>,
    validate: impl Fn(&[Row]) -> bool,
) -> LedgerResult<Option<Vec<Row>>> {
    let mut workbook = Workbook::open(path)?;
    let sheet_names = workbook.sheet_names();

    for &wanted in plan.sheet_candidates {
        let Some(sheet) = sheet_names.iter().find(|s| s.eq_ignore_ascii_case(wanted)) else {
            continue;
        };
        for &header_at in plan.header_row_candidates {
            if let Ok(rows) = workbook.read_rows(sheet, header_at) {
                if validate(&rows) {
                    return Ok(Some(rows));
                }
            }
        }
    }
    Ok(None)
}
