//! Portfolio XIRR (§4.9): Newton–Raphson over a dated cash-flow series,
//! grounded on
//! `examples/original_source/src/pfas/services/portfolio_valuation_service.py`'s
//! `_calculate_xirr`. `Money`'s own doc comment already calls this out as
//! the one place in the workspace sanctioned to work in `f64` rather than
//! `Decimal` — a root-finder needs a derivative, and `Decimal` has none.

use chrono::NaiveDate;
use ledger_domain::{AssetClass, LedgerResult, Money, UserId};
use ledger_store::from_rusqlite;
use rusqlite::Transaction;

const MAX_ITERATIONS: u32 = 100;
const CONVERGENCE_EPSILON: f64 = 0.001;
const INITIAL_RATE: f64 = 0.10;
const MIN_RATE: f64 = -0.99;

#[derive(Debug, Clone, Copy)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

fn days_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

fn npv(rate: f64, flows: &[DatedCashFlow], t0: NaiveDate) -> f64 {
    flows.iter().map(|f| f.amount / (1.0 + rate).powf(days_between(t0, f.date) / 365.0)).sum()
}

fn npv_derivative(rate: f64, flows: &[DatedCashFlow], t0: NaiveDate) -> f64 {
    flows
        .iter()
        .map(|f| {
            let t = days_between(t0, f.date) / 365.0;
            -t * f.amount / (1.0 + rate).powf(t + 1.0)
        })
        .sum()
}

/// Solves for the rate that zeroes the NPV of `flows`, or `None` if the
/// series has fewer than two flows, lacks both a negative and a positive
/// flow, or Newton–Raphson fails to converge within the iteration budget.
pub fn xirr(flows: &[DatedCashFlow]) -> Option<f64> {
    if flows.len() < 2 {
        return None;
    }
    let has_negative = flows.iter().any(|f| f.amount < 0.0);
    let has_positive = flows.iter().any(|f| f.amount > 0.0);
    if !has_negative || !has_positive {
        return None;
    }

    let t0 = flows.iter().map(|f| f.date).min().unwrap();
    let mut rate = INITIAL_RATE;

    for _ in 0..MAX_ITERATIONS {
        let value = npv(rate, flows, t0);
        if value.abs() < CONVERGENCE_EPSILON {
            return Some(rate);
        }
        let derivative = npv_derivative(rate, flows, t0);
        if derivative.abs() < f64::EPSILON {
            return None;
        }
        rate -= value / derivative;
        if rate <= MIN_RATE {
            rate = MIN_RATE + 0.01;
        }
    }

    None
}

#[derive(Debug, Clone)]
pub struct AssetClassXirr {
    pub asset_class: AssetClass,
    pub xirr: Option<f64>,
    pub flow_count: usize,
}

/// Computes XIRR per asset class: every purchase is a negative flow on
/// its transaction date, every disposal a positive flow, and the current
/// holding value (from [`crate::balance_sheet`]) a terminal positive flow
/// dated `today`.
pub fn portfolio_xirr(tx: &Transaction<'_>, user_id: UserId, asset_class: AssetClass, current_value: Money, today: NaiveDate) -> LedgerResult<AssetClassXirr> {
    let mut flows = Vec::new();

    match asset_class {
        AssetClass::EquityMutualFund | AssetClass::DebtMutualFund => {
            let mut stmt = tx
                .prepare(
                    "SELECT txn_date, amount, txn_type FROM mf_transactions WHERE user_id = ?1
                     AND txn_type IN ('Purchase', 'Redemption', 'SwitchIn', 'SwitchOut')",
                )
                .map_err(from_rusqlite)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id.0], |row| {
                    let date: String = row.get(0)?;
                    let amount: String = row.get(1)?;
                    let txn_type: String = row.get(2)?;
                    Ok((date, amount, txn_type))
                })
                .map_err(from_rusqlite)?;
            for row in rows {
                let (date, amount, txn_type) = row.map_err(from_rusqlite)?;
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| ledger_domain::LedgerError::invalid(e.to_string()))?;
                let amount: f64 = amount.parse().unwrap_or_default();
                let signed = if matches!(txn_type.as_str(), "Purchase" | "SwitchIn") { -amount } else { amount };
                flows.push(DatedCashFlow { date, amount: signed });
            }
        }
        AssetClass::IndianStock | AssetClass::ForeignStock => {
            let mut stmt = tx
                .prepare("SELECT trade_date, quantity, price, trade_type FROM stock_trades WHERE user_id = ?1")
                .map_err(from_rusqlite)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id.0], |row| {
                    let date: String = row.get(0)?;
                    let qty: String = row.get(1)?;
                    let price: String = row.get(2)?;
                    let trade_type: String = row.get(3)?;
                    Ok((date, qty, price, trade_type))
                })
                .map_err(from_rusqlite)?;
            for row in rows {
                let (date, qty, price, trade_type) = row.map_err(from_rusqlite)?;
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| ledger_domain::LedgerError::invalid(e.to_string()))?;
                let qty: f64 = qty.parse().unwrap_or_default();
                let price: f64 = price.parse().unwrap_or_default();
                let amount = qty * price;
                let signed = if trade_type == "Buy" { -amount } else { amount };
                flows.push(DatedCashFlow { date, amount: signed });
            }
        }
        _ => {}
    }

    if !current_value.is_zero() && !flows.is_empty() {
        let value: f64 = current_value.raw().to_string().parse().unwrap_or(0.0);
        flows.push(DatedCashFlow { date: today, amount: value });
    }

    let flow_count = flows.len();
    Ok(AssetClassXirr { asset_class, xirr: xirr(&flows), flow_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_for_a_simple_doubling_investment() {
        let flows = vec![
            DatedCashFlow { date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), amount: -100_000.0 },
            DatedCashFlow { date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), amount: 200_000.0 },
        ];
        let rate = xirr(&flows).unwrap();
        assert!((rate - 1.0).abs() < 0.01, "expected ~100% return, got {rate}");
    }

    #[test]
    fn returns_none_for_all_negative_flows() {
        let flows = vec![
            DatedCashFlow { date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), amount: -100.0 },
            DatedCashFlow { date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(), amount: -50.0 },
        ];
        assert!(xirr(&flows).is_none());
    }

    #[test]
    fn returns_none_for_a_single_flow() {
        let flows = vec![DatedCashFlow { date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), amount: -100.0 }];
        assert!(xirr(&flows).is_none());
    }
}
