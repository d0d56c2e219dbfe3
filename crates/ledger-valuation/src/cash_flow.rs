//! Cash flow statement for a financial year (§4.9), classifying each
//! bank-statement line into Operating / Investing / Financing by a
//! keyword rule table, transcribed from
//! `examples/original_source/src/pfas/services/cash_flow_service.py`'s
//! `CashFlowClassificationRule` list — an in-code table, not a DB one,
//! matching how the original keeps it (and how `ledger-journal`'s
//! `posting_rules` keeps its own table in code rather than in SQLite).

use ledger_domain::{FinancialYear, LedgerResult, Money, UserId};
use ledger_store::from_rusqlite;
use rusqlite::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Activity {
    Operating,
    Investing,
    Financing,
}

struct ClassificationRule {
    keywords: &'static [&'static str],
    activity: Activity,
    category: &'static str,
}

const RULES: &[ClassificationRule] = &[
    ClassificationRule { keywords: &["SALARY", "SAL CR", "EMPLOYER"], activity: Activity::Operating, category: "salary" },
    ClassificationRule { keywords: &["DIVIDEND", "DIV CR"], activity: Activity::Operating, category: "dividend" },
    ClassificationRule { keywords: &["INT PD", "INTEREST", "INT.CREDIT", "INT CR"], activity: Activity::Operating, category: "interest" },
    ClassificationRule { keywords: &["RENT", "RENTAL"], activity: Activity::Operating, category: "rent" },
    ClassificationRule { keywords: &["INCOME TAX", "ADVANCE TAX", "TDS", "GST"], activity: Activity::Operating, category: "tax" },
    ClassificationRule { keywords: &["LIC", "INSURANCE", "PREMIUM"], activity: Activity::Operating, category: "insurance" },
    ClassificationRule { keywords: &["MF REDEMPTION", "FUND REDEMP"], activity: Activity::Investing, category: "mf_redemption" },
    ClassificationRule { keywords: &["STOCK SALE", "ZERODHA CR", "GROWW CR"], activity: Activity::Investing, category: "stock_sale" },
    ClassificationRule { keywords: &["FD MATURITY", "TDR MATURITY"], activity: Activity::Investing, category: "fd_maturity" },
    ClassificationRule { keywords: &["SIP", "MF PURCHASE", "MUTUAL FUND"], activity: Activity::Investing, category: "mf_purchase" },
    ClassificationRule { keywords: &["ZERODHA", "GROWW", "STOCK"], activity: Activity::Investing, category: "stock_purchase" },
    ClassificationRule { keywords: &["PPF", "PUBLIC PROVIDENT"], activity: Activity::Investing, category: "ppf" },
    ClassificationRule { keywords: &["NPS", "NATIONAL PENSION"], activity: Activity::Investing, category: "nps" },
    ClassificationRule { keywords: &["SGB", "SOVEREIGN GOLD"], activity: Activity::Investing, category: "sgb" },
    ClassificationRule { keywords: &["LOAN DISB", "LOAN CR"], activity: Activity::Financing, category: "loan_disbursement" },
    ClassificationRule { keywords: &["EMI", "LOAN EMI", "HOME LOAN", "CAR LOAN"], activity: Activity::Financing, category: "loan_emi" },
    ClassificationRule { keywords: &["CREDIT CARD", "CC PAYMENT"], activity: Activity::Financing, category: "credit_card" },
];

fn classify(description: &str, amount: Money) -> (Activity, &'static str) {
    let upper = description.to_uppercase();
    for rule in RULES {
        if rule.keywords.iter().any(|kw| upper.contains(kw)) {
            return (rule.activity, rule.category);
        }
    }
    if amount.is_negative() {
        (Activity::Operating, "other_operating_outflow")
    } else {
        (Activity::Operating, "other_operating_inflow")
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ActivityTotals {
    pub inflow: Money,
    pub outflow: Money,
    pub net: Money,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CashFlowStatement {
    pub financial_year: String,
    pub operating: ActivityTotals,
    pub investing: ActivityTotals,
    pub financing: ActivityTotals,
    pub opening_cash: Money,
    pub closing_cash: Money,
    pub categories: Vec<(String, Activity, Money)>,
}

fn bucket(totals: &mut ActivityTotals, amount: Money) {
    if amount.is_negative() {
        totals.outflow += amount.abs();
    } else {
        totals.inflow += amount;
    }
    totals.net += amount;
}

/// Builds the cash flow statement for `fy`, given the already-computed
/// balance-sheet cash position at the FY's start and end dates (§4.9:
/// "opening/closing cash = balance-sheet cash at FY start/end").
pub fn compute_cash_flow(
    tx: &Transaction<'_>,
    user_id: UserId,
    fy: FinancialYear,
    opening_cash: Money,
    closing_cash: Money,
) -> LedgerResult<CashFlowStatement> {
    let start = fy.start_date();
    let end = fy.end_date();

    let mut stmt = tx
        .prepare("SELECT raw_description, amount FROM bank_transactions WHERE user_id = ?1 AND txn_date >= ?2 AND txn_date <= ?3")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, start.to_string(), end.to_string()], |row| {
            let description: String = row.get(0)?;
            let amount: String = row.get(1)?;
            Ok((description, amount))
        })
        .map_err(from_rusqlite)?;

    let mut operating = ActivityTotals::default();
    let mut investing = ActivityTotals::default();
    let mut financing = ActivityTotals::default();
    let mut categories: std::collections::BTreeMap<(String, bool), Money> = std::collections::BTreeMap::new();

    for row in rows {
        let (description, amount) = row.map_err(from_rusqlite)?;
        let amount = Money::new(amount.parse().unwrap_or_default());
        let (activity, category) = classify(&description, amount);
        match activity {
            Activity::Operating => bucket(&mut operating, amount),
            Activity::Investing => bucket(&mut investing, amount),
            Activity::Financing => bucket(&mut financing, amount),
        }
        let key = (category.to_string(), matches!(activity, Activity::Operating));
        *categories.entry(key).or_insert(Money::ZERO) += amount;
    }

    let mut category_rows: Vec<(String, Activity, Money)> = Vec::new();
    for ((category, _), total) in categories {
        let activity = RULES.iter().find(|r| r.category == category).map(|r| r.activity).unwrap_or(Activity::Operating);
        category_rows.push((category, activity, total));
    }

    Ok(CashFlowStatement {
        financial_year: fy.to_string(),
        operating,
        investing,
        financing,
        opening_cash,
        closing_cash,
        categories: category_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;

    #[test]
    fn classifies_salary_as_operating_inflow() {
        let store = Store::open_in_memory().unwrap();
        let statement = store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO bank_transactions (user_id, bank, txn_date, raw_description, amount, natural_key_hash, source)
                     VALUES (1, 'HDFC', '2024-05-01', 'SALARY CREDIT ACME CORP', '150000', 'h1', 'test')",
                    [],
                )
                .unwrap();
                tx.execute(
                    "INSERT INTO bank_transactions (user_id, bank, txn_date, raw_description, amount, natural_key_hash, source)
                     VALUES (1, 'HDFC', '2024-06-01', 'EMI LOAN EMI HOME LOAN', '-25000', 'h2', 'test')",
                    [],
                )
                .unwrap();
                compute_cash_flow(tx, UserId(1), FinancialYear { start_year: 2024 }, Money::ZERO, Money::ZERO)
            })
            .unwrap();

        assert_eq!(statement.operating.inflow, Money::new(rust_decimal::Decimal::new(15000000, 2)));
        assert_eq!(statement.financing.outflow, Money::new(rust_decimal::Decimal::new(2500000, 2)));
    }
}
