//! Bank statement parser (Excel/CSV), grounded on §4.5's bank-statement
//! case: header detected by keyword-overlap scoring over the first 20
//! rows (bank statements don't have a fixed RTA-style offset), natural
//! key is a SHA-256 of `(user, bank, date, raw_description, amount)`
//! since bank statements carry no durable per-row identifier.

use std::path::Path;

use ledger_domain::LedgerResult;
use sha2::{Digest, Sha256};

use crate::classify::detect_header_row;
use crate::csv_reader;
use crate::result::{BankTransactionRecord, ParseResult, ParsedRecord};
use crate::row::Row;
use crate::tabular::Workbook;

const EXPECTED_HEADERS: &[&str] = &["date", "description", "narration", "debit", "credit", "amount", "balance"];
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d-%b-%Y"];
const MAX_HEADER_SCAN_ROWS: usize = 20;

fn is_csv(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("csv")).unwrap_or(false)
}

pub fn natural_key_hash(user_id: i64, bank: &str, txn_date: chrono::NaiveDate, raw_description: &str, amount: rust_decimal::Decimal) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.to_le_bytes());
    hasher.update(bank.as_bytes());
    hasher.update(txn_date.to_string().as_bytes());
    hasher.update(raw_description.as_bytes());
    hasher.update(amount.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn parse(path: &Path, user_id: i64, bank: &str, account_number: Option<&str>) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let rows = if is_csv(path) {
        let raw_text_rows = csv_reader::read_raw_rows(path)?;
        let header_at = detect_header_row(&raw_text_rows, EXPECTED_HEADERS, MAX_HEADER_SCAN_ROWS).unwrap_or(0);
        csv_reader::read_rows(path, header_at)?
    } else {
        let mut workbook = Workbook::open(path)?;
        let sheet_names = workbook.sheet_names();
        let Some(sheet) = sheet_names.first().cloned() else {
            return Ok(ParseResult::failed(source, "workbook has no sheets"));
        };

        // Scan the raw sheet (header row unknown) to locate the header by
        // keyword-overlap scoring, then re-read from that offset.
        let raw_rows = workbook.read_rows(&sheet, 0).unwrap_or_default();
        let text_rows: Vec<Vec<String>> = raw_rows
            .iter()
            .map(|r| EXPECTED_HEADERS.iter().filter_map(|h| r.get_by_any(&[h]).map(|s| s.to_string())).collect())
            .collect();
        let header_at = detect_header_row(&text_rows, EXPECTED_HEADERS, MAX_HEADER_SCAN_ROWS).unwrap_or(0);
        workbook.read_rows(&sheet, header_at)?
    };

    let mut result = ParseResult::empty(source);
    for (idx, row) in rows.iter().enumerate() {
        match parse_row(row, user_id, bank, account_number) {
            Ok(Some(record)) => result.records.push(ParsedRecord::BankTransaction(record)),
            Ok(None) => {}
            Err(e) => result.add_warning(format!("row {idx}: {e}")),
        }
    }
    if result.records.is_empty() {
        result.add_warning("no transactions found in file");
    }
    Ok(result)
}

fn parse_row(row: &Row, user_id: i64, bank: &str, account_number: Option<&str>) -> Result<Option<BankTransactionRecord>, String> {
    let Some(txn_date) = row.get_date_by_any(&["Date", "Transaction Date", "Value Date"], DATE_FORMATS) else {
        return Ok(None);
    };
    let description = row
        .get_by_any(&["Description", "Narration", "Particulars"])
        .unwrap_or("")
        .to_string();

    let amount = if let Some(amt) = row.get_decimal_by_any(&["Amount"]) {
        amt
    } else {
        let debit = row.get_decimal_by_any(&["Debit", "Withdrawal"]).unwrap_or_default();
        let credit = row.get_decimal_by_any(&["Credit", "Deposit"]).unwrap_or_default();
        credit - debit
    };
    if amount.is_zero() && description.is_empty() {
        return Ok(None);
    }

    let hash = natural_key_hash(user_id, bank, txn_date, &description, amount);

    Ok(Some(BankTransactionRecord {
        bank: bank.to_string(),
        account_number: account_number.map(|s| s.to_string()),
        txn_date,
        raw_description: description,
        amount,
        balance_after: row.get_decimal_by_any(&["Balance", "Closing Balance"]),
        natural_key_hash: hash,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn hash_is_stable_for_the_same_inputs() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let a = natural_key_hash(1, "HDFC", date, "UPI/some/txn", dec!(1500));
        let b = natural_key_hash(1, "HDFC", date, "UPI/some/txn", dec!(1500));
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_when_description_differs() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let a = natural_key_hash(1, "HDFC", date, "UPI/txn/1", dec!(1500));
        let b = natural_key_hash(1, "HDFC", date, "UPI/txn/2", dec!(1500));
        assert_ne!(a, b);
    }

    #[test]
    fn combines_debit_credit_columns_into_signed_amount() {
        let mut row = Row::new();
        row.insert("Date", "2024-05-01".to_string());
        row.insert("Description", "Salary credit".to_string());
        row.insert("Credit", "50000".to_string());
        let record = parse_row(&row, 1, "HDFC", Some("XXXX1234")).unwrap().unwrap();
        assert_eq!(record.amount, dec!(50000));
    }

    #[test]
    fn parses_a_csv_bank_statement_export() {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Description,Debit,Credit,Balance").unwrap();
        writeln!(file, "01/05/2024,UPI/salary/credit,,50000,150000").unwrap();
        writeln!(file, "03/05/2024,NEFT/rent/debit,20000,,130000").unwrap();

        let result = parse(file.path(), 1, "HDFC", Some("XXXX1234")).unwrap();
        assert!(result.success);
        assert_eq!(result.records.len(), 2);
    }
}
