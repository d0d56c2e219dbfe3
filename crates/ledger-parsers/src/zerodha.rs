//! Zerodha Tradebook parser (Excel), grounded on
//! `examples/original_source/src/pfas/parsers/stock/zerodha.py`: the
//! new-format "Tradewise Exits" sheet has its header at row 15 (index
//! 14) per §4.5's fixed-offset table; quantity sign drives buy/sell per
//! §4.5 item 3. Natural key `(symbol, trade_date, trade_type, quantity,
//! price)` per §4.5's table.

use std::path::Path;

use ledger_domain::LedgerResult;

use crate::classify::classify_by_unit_sign;
use crate::result::{ParseResult, ParsedRecord, StockTradeRecord};
use crate::row::Row;
use crate::tabular::Workbook;

const HEADER_ROW_CANDIDATES: &[usize] = &[14, 0, 1];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y"];

fn find_tradewise_sheet<'a>(sheet_names: &'a [String]) -> Option<&'a str> {
    sheet_names
        .iter()
        .find(|name| name.to_uppercase().contains("TRADEWISE"))
        .map(|s| s.as_str())
}

fn validate(rows: &[Row]) -> bool {
    rows.iter()
        .any(|r| r.get_by_any(&["Symbol"]).is_some() && r.get_by_any(&["Quantity"]).is_some())
}

pub fn parse(path: &Path) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let mut workbook = Workbook::open(path)?;
    let sheet_names = workbook.sheet_names();
    let Some(sheet) = find_tradewise_sheet(&sheet_names).map(str::to_string) else {
        return Ok(ParseResult::failed(source, "no Tradewise Exits sheet found"));
    };

    let mut rows = None;
    for &header_at in HEADER_ROW_CANDIDATES {
        if let Ok(candidate) = workbook.read_rows(&sheet, header_at) {
            if validate(&candidate) {
                rows = Some(candidate);
                break;
            }
        }
    }
    let Some(rows) = rows else {
        return Ok(ParseResult::failed(source, "no valid header row found in Tradewise Exits sheet"));
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
        result.add_warning("no trades found in file");
    }
    Ok(result)
}

fn parse_row(row: &Row) -> Result<Option<StockTradeRecord>, String> {
    let Some(symbol) = row.get_by_any(&["Symbol"]) else {
        return Ok(None);
    };
    let Some(trade_date) = row.get_date_by_any(&["Trade Date", "Exit Date"], DATE_FORMATS) else {
        return Ok(None);
    };
    let quantity = row.get_decimal_by_any(&["Quantity"]).ok_or("missing Quantity")?;
    let price = row.get_decimal_by_any(&["Price", "Exit Average"]).ok_or("missing Price")?;
    let purchase_date = row.get_date_by_any(&["Buy Date", "Entry Date"], DATE_FORMATS);

    Ok(Some(StockTradeRecord {
        symbol: symbol.to_string(),
        isin: row.get_by_any(&["ISIN"]).map(|s| s.to_string()),
        trade_date,
        trade_type: classify_by_unit_sign(quantity),
        quantity,
        price,
        purchase_date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_tradewise_sheet_case_insensitively() {
        let names = vec!["Summary".to_string(), "Tradewise Exits from 2024-01-01".to_string()];
        assert_eq!(find_tradewise_sheet(&names), Some("Tradewise Exits from 2024-01-01"));
    }

    #[test]
    fn negative_quantity_classifies_as_sell() {
        let mut row = Row::new();
        row.insert("Symbol", "INFY".to_string());
        row.insert("Trade Date", "2024-03-01".to_string());
        row.insert("Quantity", "-50".to_string());
        row.insert("Price", "1500.25".to_string());

        let record = parse_row(&row).unwrap().unwrap();
        assert!(matches!(record.trade_type, crate::result::TxnTypeHint::Sell));
    }
}
