//! Karvy/KFintech consolidated account statement parser (Excel),
//! grounded on `examples/original_source/src/pfas/parsers/mf/karvy.py`.
//! Same shape as the CAMS parser but with header at row 5 (index 4) per
//! §4.5's fixed-offset table, and Karvy's own column name variants.

use std::path::Path;

use ledger_domain::LedgerResult;

use crate::classify::classify_mf_description;
use crate::result::{MfTransactionRecord, ParseResult, ParsedRecord};
use crate::row::Row;
use crate::tabular::{read_with_fallback, FallbackPlan};

const SHEET_CANDIDATES: &[&str] = &["Transaction Statement", "TRANSACTIONS", "Sheet1"];
const HEADER_ROW_CANDIDATES: &[usize] = &[4, 0, 3, 5];
const DATE_FORMATS: &[&str] = &["%d-%b-%Y", "%d/%m/%Y", "%Y-%m-%d"];

fn validate(rows: &[Row]) -> bool {
    rows.iter()
        .any(|r| r.get_by_any(&["Scheme Name", "Fund Name"]).is_some() && r.get_by_any(&["Transaction Date", "Date"]).is_some())
}

pub fn parse(path: &Path) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let plan = FallbackPlan {
        sheet_candidates: SHEET_CANDIDATES,
        header_row_candidates: HEADER_ROW_CANDIDATES,
    };
    let Some(rows) = read_with_fallback(path, &plan, validate)? else {
        return Ok(ParseResult::failed(source, "no Karvy-shaped sheet/header combination found"));
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
    let Some(scheme) = row.get_by_any(&["Scheme Name", "Fund Name"]) else {
        return Ok(None);
    };
    let folio = row.get_by_any(&["Folio No", "Folio Number"]).unwrap_or("").to_string();
    let desc = row.get_by_any(&["Transaction Type", "Trxn Type", "Description"]).unwrap_or("");
    let txn_type = classify_mf_description(desc);

    let Some(txn_date) = row.get_date_by_any(&["Transaction Date", "Date"], DATE_FORMATS) else {
        return Ok(None);
    };
    let purchase_date = row.get_date_by_any(&["Purchase Date"], DATE_FORMATS);

    let units = row.get_decimal_by_any(&["Units", "Unit Balance"]).unwrap_or_default();
    let nav = row.get_decimal_by_any(&["NAV", "Purchase Price"]);
    let amount = row.get_decimal_by_any(&["Amount", "Transaction Amount"]).ok_or("missing Amount")?;

    Ok(Some(MfTransactionRecord {
        folio,
        scheme: scheme.to_string(),
        isin: row.get_by_any(&["ISIN"]).map(|s| s.to_string()),
        txn_date,
        txn_type,
        units,
        nav,
        amount,
        purchase_date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_purchase_row() {
        let mut row = Row::new();
        row.insert("Scheme Name", "Axis Bluechip Fund".to_string());
        row.insert("Folio No", "9988".to_string());
        row.insert("Transaction Type", "Purchase".to_string());
        row.insert("Transaction Date", "2023-05-01".to_string());
        row.insert("Units", "200.0".to_string());
        row.insert("NAV", "50.00".to_string());
        row.insert("Amount", "10000.00".to_string());

        let record = parse_row(&row).unwrap().unwrap();
        assert_eq!(record.folio, "9988");
        assert!(matches!(record.txn_type, crate::result::TxnTypeHint::Purchase));
    }
}
