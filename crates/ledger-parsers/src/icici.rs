//! ICICI Direct stock-sell statement parser (Excel), grounded on
//! `examples/original_source/src/pfas/parsers/stock/icici.py`. ICICI's
//! statements are sell-only, each row pre-matched against its purchase
//! lot, natural key `(symbol, sale_date, quantity, purchase_date)` per
//! §4.5's table.

use std::path::Path;

use ledger_domain::LedgerResult;

use crate::result::{ParseResult, ParsedRecord, StockTradeRecord, TxnTypeHint};
use crate::row::Row;
use crate::tabular::{read_with_fallback, FallbackPlan};

const SHEET_CANDIDATES: &[&str] = &["Sheet1", "Capital Gain", "Realized Gain"];
const HEADER_ROW_CANDIDATES: &[usize] = &[0, 1, 2];
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

fn validate(rows: &[Row]) -> bool {
    rows.iter()
        .any(|r| r.get_by_any(&["Symbol", "Scrip Name"]).is_some() && r.get_by_any(&["Sale Date", "Quantity"]).is_some())
}

pub fn parse(path: &Path) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let plan = FallbackPlan {
        sheet_candidates: SHEET_CANDIDATES,
        header_row_candidates: HEADER_ROW_CANDIDATES,
    };
    let Some(rows) = read_with_fallback(path, &plan, validate)? else {
        return Ok(ParseResult::failed(source, "no ICICI-shaped sheet/header combination found"));
    };

    let mut result = ParseResult::empty(source);
    for (idx, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok(Some(record)) => result.records.push(ParsedRecord::StockTrade(record)),
            Ok(None) => {}
            Err(e) => result.add_warning(format!("row {idx}: {e}")),
        }
    }
    if result.records.is_empty() {
        result.add_warning("no sell trades found in file");
    }
    Ok(result)
}

fn parse_row(row: &Row) -> Result<Option<StockTradeRecord>, String> {
    let Some(symbol) = row.get_by_any(&["Symbol", "Scrip Name"]) else {
        return Ok(None);
    };
    let Some(sale_date) = row.get_date_by_any(&["Sale Date"], DATE_FORMATS) else {
        return Ok(None);
    };
    let quantity = row.get_decimal_by_any(&["Quantity"]).ok_or("missing Quantity")?;
    let price = row.get_decimal_by_any(&["Sale Price", "Sale Rate"]).ok_or("missing Sale Price")?;
    let purchase_date = row.get_date_by_any(&["Purchase Date"], DATE_FORMATS);

    Ok(Some(StockTradeRecord {
        symbol: symbol.to_string(),
        isin: row.get_by_any(&["ISIN"]).map(|s| s.to_string()),
        trade_date: sale_date,
        trade_type: TxnTypeHint::Sell,
        quantity: quantity.abs(),
        price,
        purchase_date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sells_are_always_classified_sell_regardless_of_quantity_sign() {
        let mut row = Row::new();
        row.insert("Symbol", "TCS".to_string());
        row.insert("Sale Date", "2024-02-10".to_string());
        row.insert("Quantity", "25".to_string());
        row.insert("Sale Price", "3800.00".to_string());
        row.insert("Purchase Date", "2021-01-05".to_string());

        let record = parse_row(&row).unwrap().unwrap();
        assert_eq!(record.trade_type, TxnTypeHint::Sell);
        assert_eq!(record.purchase_date, chrono::NaiveDate::from_ymd_opt(2021, 1, 5));
    }
}
