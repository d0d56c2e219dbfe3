//! PPF passbook parser (Excel/CSV export), a thin variant of the bank
//! parser pattern since PPF passbooks share the same
//! date/description/amount/balance shape as a bank statement but key
//! on account number instead of a SHA-256 natural key. Natural key
//! `(account_number, date, amount, txn_type)` per §4.5's table.

use std::path::Path;

use ledger_domain::LedgerResult;

use crate::result::{ParseResult, ParsedRecord, PpfTransactionRecord, TxnTypeHint};
use crate::row::Row;
use crate::tabular::{read_with_fallback, FallbackPlan};

const SHEET_CANDIDATES: &[&str] = &["Sheet1", "Passbook", "Transactions"];
const HEADER_ROW_CANDIDATES: &[usize] = &[0, 1, 2];
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

fn validate(rows: &[Row]) -> bool {
    rows.iter().any(|r| r.get_by_any(&["Date", "Transaction Date"]).is_some() && r.get_by_any(&["Amount"]).is_some())
}

pub fn parse(path: &Path, account_number: &str) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let plan = FallbackPlan {
        sheet_candidates: SHEET_CANDIDATES,
        header_row_candidates: HEADER_ROW_CANDIDATES,
    };
    let Some(rows) = read_with_fallback(path, &plan, validate)? else {
        return Ok(ParseResult::failed(source, "no PPF passbook-shaped sheet/header combination found"));
    };

    let mut result = ParseResult::empty(source);
    for (idx, row) in rows.iter().enumerate() {
        match parse_row(row, account_number) {
            Ok(Some(record)) => result.records.push(ParsedRecord::PpfTransaction(record)),
            Ok(None) => {}
            Err(e) => result.add_warning(format!("row {idx}: {e}")),
        }
    }
    if result.records.is_empty() {
        result.add_warning("no transactions found in file");
    }
    Ok(result)
}

fn parse_row(row: &Row, account_number: &str) -> Result<Option<PpfTransactionRecord>, String> {
    let Some(txn_date) = row.get_date_by_any(&["Date", "Transaction Date"], DATE_FORMATS) else {
        return Ok(None);
    };
    let amount = row.get_decimal_by_any(&["Amount", "Deposit", "Withdrawal"]).ok_or("missing Amount")?;
    let description = row.get_by_any(&["Description", "Particulars", "Narration"]).unwrap_or("");
    let txn_type = if amount.is_sign_negative() || description.to_uppercase().contains("WITHDRAW") {
        TxnTypeHint::Withdrawal
    } else {
        TxnTypeHint::Deposit
    };

    Ok(Some(PpfTransactionRecord {
        account_number: account_number.to_string(),
        txn_date,
        amount: amount.abs(),
        txn_type,
        balance_after: row.get_decimal_by_any(&["Balance", "Closing Balance"]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_withdrawal_from_negative_amount() {
        let mut row = Row::new();
        row.insert("Date", "2024-04-15".to_string());
        row.insert("Amount", "-5000".to_string());
        let record = parse_row(&row, "PPF001").unwrap().unwrap();
        assert_eq!(record.txn_type, TxnTypeHint::Withdrawal);
        assert_eq!(record.amount, "5000".parse().unwrap());
    }
}
