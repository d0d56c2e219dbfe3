//! Keyword-based transaction-type classification, grounded on
//! `_determine_transaction_type`'s description-keyword cascade (CAMS)
//! and scheme-name equity/debt/hybrid classification grounded on
//! `classifier.py`'s keyword lists.

use crate::result::TxnTypeHint;

/// Classifies an MF transaction description the way CAMS/Karvy do:
/// REDEMPTION, SWITCH OUT/IN, DIVIDEND (+REINVEST), else PURCHASE.
pub fn classify_mf_description(description: &str) -> TxnTypeHint {
    let desc = description.to_uppercase();
    if desc.contains("REDEMPTION") {
        TxnTypeHint::Redemption
    } else if desc.contains("SWITCH OUT") || desc.contains("SWITCH-OUT") {
        TxnTypeHint::SwitchOut
    } else if desc.contains("SWITCH IN") || desc.contains("SWITCH-IN") {
        TxnTypeHint::SwitchIn
    } else if desc.contains("DIVIDEND") && desc.contains("REINVEST") {
        TxnTypeHint::DividendReinvest
    } else if desc.contains("DIVIDEND") {
        TxnTypeHint::Dividend
    } else {
        TxnTypeHint::Purchase
    }
}

/// Classifies a stock/MF trade from the signed unit quantity (§4.5 item
/// 3): positive → buy, negative → sell, zero → unknown (tax/misc rows
/// fall through to the description-based classifier instead).
pub fn classify_by_unit_sign(units: rust_decimal::Decimal) -> TxnTypeHint {
    use std::cmp::Ordering;
    match units.cmp(&rust_decimal::Decimal::ZERO) {
        Ordering::Greater => TxnTypeHint::Buy,
        Ordering::Less => TxnTypeHint::Sell,
        Ordering::Equal => TxnTypeHint::Unknown,
    }
}

const EQUITY_KEYWORDS: &[&str] = &[
    "EQUITY", "BLUECHIP", "LARGE CAP", "LARGECAP", "MID CAP", "MIDCAP", "SMALL CAP", "SMALLCAP",
    "FLEXI CAP", "FLEXICAP", "MULTI CAP", "MULTICAP", "ELSS", "DIVIDEND YIELD", "VALUE FUND",
    "FOCUSED FUND", "CONTRA FUND", "INDEX FUND", "SECTOR FUND", "THEMATIC",
];

const DEBT_KEYWORDS: &[&str] = &[
    "LIQUID FUND", "OVERNIGHT FUND", "MONEY MARKET", "SHORT DURATION", "LOW DURATION",
    "ULTRA SHORT", "CORPORATE BOND", "BANKING AND PSU", "GILT FUND", "CREDIT RISK", "DYNAMIC BOND",
];

const HYBRID_KEYWORDS: &[&str] = &["HYBRID", "BALANCED ADVANTAGE", "AGGRESSIVE HYBRID", "CONSERVATIVE HYBRID", "ARBITRAGE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeClass {
    Equity,
    Debt,
    Hybrid,
    Other,
}

/// Classifies a scheme by name keyword, checking hybrid first (hybrid
/// names often contain both equity and debt keywords), then debt (more
/// specific than equity), then equity — the same ordering
/// `classify_scheme` uses.
pub fn classify_scheme(scheme_name: &str) -> SchemeClass {
    let name = scheme_name.to_uppercase();
    if HYBRID_KEYWORDS.iter().any(|k| name.contains(k)) {
        return SchemeClass::Hybrid;
    }
    if DEBT_KEYWORDS.iter().any(|k| name.contains(k)) {
        return SchemeClass::Debt;
    }
    if EQUITY_KEYWORDS.iter().any(|k| name.contains(k)) {
        return SchemeClass::Equity;
    }
    SchemeClass::Other
}

/// Header-row detection by keyword-overlap scoring over the first 20
/// rows (§4.5 item 1, bank-statement case): the row with the most
/// `expected_headers` matches (case-insensitive, substring) wins.
pub fn detect_header_row(rows: &[Vec<String>], expected_headers: &[&str], max_rows_to_scan: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in rows.iter().take(max_rows_to_scan).enumerate() {
        let cells: Vec<String> = row.iter().map(|c| c.to_uppercase()).collect();
        let score = expected_headers
            .iter()
            .filter(|expected| cells.iter().any(|c| c.contains(&expected.to_uppercase())))
            .count();
        if score == 0 {
            continue;
        }
        if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn classifies_redemption_over_purchase() {
        assert_eq!(classify_mf_description("Redemption - Systematic"), TxnTypeHint::Redemption);
        assert_eq!(classify_mf_description("Purchase - Lumpsum"), TxnTypeHint::Purchase);
        assert_eq!(classify_mf_description("Dividend Reinvestment"), TxnTypeHint::DividendReinvest);
    }

    #[test]
    fn classifies_scheme_by_keyword_priority() {
        assert_eq!(classify_scheme("HDFC Balanced Advantage Fund"), SchemeClass::Hybrid);
        assert_eq!(classify_scheme("ICICI Prudential Liquid Fund"), SchemeClass::Debt);
        assert_eq!(classify_scheme("SBI Small Cap Fund"), SchemeClass::Equity);
    }

    #[test]
    fn classifies_buy_sell_by_unit_sign() {
        assert_eq!(classify_by_unit_sign(dec!(10)), TxnTypeHint::Buy);
        assert_eq!(classify_by_unit_sign(dec!(-10)), TxnTypeHint::Sell);
        assert_eq!(classify_by_unit_sign(dec!(0)), TxnTypeHint::Unknown);
    }

    #[test]
    fn detects_header_row_by_keyword_overlap() {
        let rows = vec![
            vec!["Statement Period".to_string()],
            vec!["Date".to_string(), "Description".to_string(), "Debit".to_string(), "Credit".to_string(), "Balance".to_string()],
            vec!["01/04/2024".to_string(), "Opening balance".to_string()],
        ];
        let found = detect_header_row(&rows, &["date", "description", "debit", "credit", "balance"], 20);
        assert_eq!(found, Some(1));
    }
}
