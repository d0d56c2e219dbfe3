//! CAMS consolidated account statement parser (Excel), grounded on
//! `examples/original_source/src/pfas/parsers/mf/cams.py`: sheet
//! `TRXN_DETAILS` (or index 1) with header at row 4 (index 3), column
//! candidates per `_parse_transaction_row`, natural key
//! `(folio, scheme, date, amount, units, txn_type)` per §4.5's table.

use std::path::Path;

use ledger_domain::LedgerResult;

use crate::classify::classify_mf_description;
use crate::result::{MfTransactionRecord, ParseResult, ParsedRecord};
use crate::row::Row;
use crate::tabular::{read_with_fallback, FallbackPlan};

const SHEET_CANDIDATES: &[&str] = &["TRXN_DETAILS", "Transaction_Details", "Sheet1"];
const HEADER_ROW_CANDIDATES: &[usize] = &[3, 0, 4, 2];

const DATE_FORMATS: &[&str] = &["%d-%b-%Y", "%d/%m/%Y", "%Y-%m-%d"];

fn validate(rows: &[Row]) -> bool {
    rows.iter()
        .any(|r| r.get_by_any(&["Scheme Name"]).is_some() && r.get_by_any(&["Date"]).is_some() && r.get_by_any(&["Amount"]).is_some())
}

pub fn parse(path: &Path) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let plan = FallbackPlan {
        sheet_candidates: SHEET_CANDIDATES,
        header_row_candidates: HEADER_ROW_CANDIDATES,
    };
    let Some(rows) = read_with_fallback(path, &plan, validate)? else {
        return Ok(ParseResult::failed(source, "no TRXN_DETAILS-shaped sheet/header combination found"));
    };

    let mut result = ParseResult::empty(source);
    for (idx, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok(Some(record)) => result.records.push(ParsedRecord::MfTransaction(record)),
            Ok(None) => {}
            Err(e) => result.add_warning(format!("row {idx}: {e}")),
        }
    }
    if result.records.is_empty() {
        result.add_warning("no transactions found in file");
    }
    Ok(result)
}

fn parse_row(row: &Row) -> Result<Option<MfTransactionRecord>, String> {
    let Some(scheme) = row.get_by_any(&["Scheme Name", "scheme_name"]) else {
        return Ok(None);
    };
    let folio = row.get_by_any(&["Folio No", "Folio Number", "folio_number"]).unwrap_or("").to_string();
    let desc = row.get_by_any(&["Desc", "Trxn.Type", "Transaction Type"]).unwrap_or("");
    let txn_type = classify_mf_description(desc);

    let Some(txn_date) = row.get_date_by_any(&["Date", "Date.1"], DATE_FORMATS) else {
        return Ok(None);
    };
    let purchase_date = row.get_date_by_any(&["Date_1", "Purchase Date"], DATE_FORMATS);

    let units = row.get_decimal_by_any(&["Units", "Current Units"]).unwrap_or_default();
    let nav = row.get_decimal_by_any(&["Price", "NAV"]);
    let amount = row.get_decimal_by_any(&["Amount"]).ok_or("missing Amount")?;
    let isin = extract_isin(scheme);

    Ok(Some(MfTransactionRecord {
        folio,
        scheme: scheme.to_string(),
        isin,
        txn_date,
        txn_type,
        units,
        nav,
        amount,
        purchase_date,
    }))
}

/// Pulls an ISIN (e.g. `INF178L01BY0`) out of a scheme-name string like
/// `"SBI Fund ISIN : INF178L01BY0"`.
fn extract_isin(scheme_name: &str) -> Option<String> {
    let re = regex::Regex::new(r"IN[A-Z0-9]{10}").ok()?;
    re.find(scheme_name).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_isin_from_scheme_name() {
        assert_eq!(extract_isin("SBI Fund ISIN : INF178L01BY0"), Some("INF178L01BY0".to_string()));
        assert_eq!(extract_isin("No isin here"), None);
    }

    #[test]
    fn skips_rows_with_no_scheme_name() {
        let row = Row::new();
        assert_eq!(parse_row(&row), Ok(None));
    }

    #[test]
    fn parses_a_redemption_row() {
        let mut row = Row::new();
        row.insert("Scheme Name", "HDFC Flexi Cap Fund".to_string());
        row.insert("Folio No", "12345".to_string());
        row.insert("Desc", "Redemption".to_string());
        row.insert("Date", "2024-06-15".to_string());
        row.insert("Units", "-100.5".to_string());
        row.insert("Price", "45.20".to_string());
        row.insert("Amount", "4542.60".to_string());

        let record = parse_row(&row).unwrap().unwrap();
        assert_eq!(record.folio, "12345");
        assert!(matches!(record.txn_type, crate::result::TxnTypeHint::Redemption));
        assert_eq!(record.amount, "4542.60".parse().unwrap());
    }
}
