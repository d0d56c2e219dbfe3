//! The four operations of the cost-basis tracker (§4.3). Every function
//! takes an open `rusqlite::Transaction` rather than owning a `Store`
//! connection itself, so a caller (the transaction service) can compose
//! a journal insert and a lot depletion inside one enclosing transaction
//! per §5's ordering guarantee.

use chrono::NaiveDate;
use ledger_domain::{
    AssetClass, HoldingPeriod, LedgerError, LedgerResult, LotId, Money, UserId, Units,
    UNITS_TOLERANCE,
};
use rusqlite::{OptionalExtension, Transaction};
use rust_decimal::Decimal;

use crate::lot::{asset_type_to_str, Lot};
use crate::matched::{CostBasisResult, MatchedLot};
use crate::method::CostBasisMethod;

/// Appends a new lot. `total_cost` is the all-in acquisition cost
/// (including any load/brokerage the caller wants reflected in basis);
/// `cost_per_unit` is derived from it.
pub fn record_purchase(
    tx: &Transaction<'_>,
    user_id: UserId,
    asset_type: AssetClass,
    symbol: &str,
    acquisition_date: NaiveDate,
    units: Units,
    total_cost: Money,
    reference: Option<&str>,
    currency: &str,
) -> LedgerResult<LotId> {
    if units.is_zero() || units.is_negative() {
        return Err(LedgerError::invalid("purchase units must be positive"));
    }
    let cost_per_unit = Money::new(total_cost.raw() / units.raw());

    tx.execute(
        "INSERT INTO cost_basis_lots
            (user_id, asset_type, symbol, acquisition_date, units_acquired, units_remaining,
             cost_per_unit, total_cost, currency, reference)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            user_id.0,
            asset_type_to_str(asset_type),
            symbol,
            acquisition_date.to_string(),
            units.raw().to_string(),
            cost_per_unit.raw().to_string(),
            total_cost.raw().to_string(),
            currency,
            reference,
        ],
    )
    .map_err(ledger_store::from_rusqlite)?;

    Ok(LotId(tx.last_insert_rowid()))
}

fn load_lots_for_key(
    tx: &Transaction<'_>,
    user_id: UserId,
    asset_type: AssetClass,
    symbol: &str,
) -> LedgerResult<Vec<Lot>> {
    let mut stmt = tx
        .prepare(
            "SELECT id, user_id, asset_type, symbol, acquisition_date, units_acquired,
                    units_remaining, cost_per_unit, total_cost, currency, reference
             FROM cost_basis_lots
             WHERE user_id = ?1 AND asset_type = ?2 AND symbol = ?3
             ORDER BY acquisition_date ASC, id ASC",
        )
        .map_err(ledger_store::from_rusqlite)?;
    let rows = stmt
        .query_map(
            rusqlite::params![user_id.0, asset_type_to_str(asset_type), symbol],
            Lot::from_row,
        )
        .map_err(ledger_store::from_rusqlite)?;
    let mut lots = Vec::new();
    for row in rows {
        lots.push(row.map_err(ledger_store::from_rusqlite)?);
    }
    Ok(lots)
}

/// Non-mutating: computes which lots a sell of `units_to_sell` would
/// consume and at what cost, without touching the stored rows.
pub fn calculate_cost_basis(
    tx: &Transaction<'_>,
    user_id: UserId,
    asset_type: AssetClass,
    symbol: &str,
    units_to_sell: Units,
    sell_date: NaiveDate,
    method: CostBasisMethod,
) -> LedgerResult<CostBasisResult> {
    let lots = load_lots_for_key(tx, user_id, asset_type, symbol)?;
    let held: Vec<&Lot> = lots.iter().filter(|l| !l.units_remaining.is_zero()).collect();

    let total_held: Decimal = held.iter().map(|l| l.units_remaining.raw()).sum();
    if total_held < units_to_sell.raw() - UNITS_TOLERANCE {
        return Err(LedgerError::InsufficientUnits {
            requested: units_to_sell.raw(),
            available: total_held,
        });
    }
    if held.is_empty() {
        return Err(LedgerError::InsufficientUnits {
            requested: units_to_sell.raw(),
            available: Decimal::ZERO,
        });
    }

    let matched_lots = match method {
        CostBasisMethod::Fifo => match_fifo(&held, units_to_sell),
        CostBasisMethod::Average => match_average(&held, units_to_sell, total_held),
    };

    let total_cost_basis = matched_lots
        .iter()
        .fold(Money::ZERO, |acc, m| acc + m.cost_matched);
    let weighted_cost_per_unit = if units_to_sell.is_zero() {
        Money::ZERO
    } else {
        Money::new(total_cost_basis.raw() / units_to_sell.raw())
    };
    let earliest = matched_lots
        .iter()
        .map(|m| m.acquisition_date)
        .min()
        .expect("at least one matched lot when units_to_sell > 0");
    let holding_period_days = (sell_date - earliest).num_days();
    let holding_period =
        HoldingPeriod::classify(holding_period_days, asset_type.holding_period_threshold_days());

    Ok(CostBasisResult {
        matched_lots,
        total_cost_basis,
        weighted_cost_per_unit,
        holding_period_days,
        holding_period,
    })
}

fn match_fifo(held: &[&Lot], units_to_sell: Units) -> Vec<MatchedLot> {
    let mut remaining_needed = units_to_sell.raw();
    let mut matched = Vec::new();
    for lot in held {
        if remaining_needed <= Decimal::ZERO {
            break;
        }
        let take = remaining_needed.min(lot.units_remaining.raw());
        if take <= Decimal::ZERO {
            continue;
        }
        let units_matched = Units::new(take);
        let cost_matched = Money::new(lot.cost_per_unit.raw() * take);
        matched.push(MatchedLot {
            lot_id: lot.id,
            units_matched,
            cost_matched,
            acquisition_date: lot.acquisition_date,
        });
        remaining_needed -= take;
    }
    matched
}

fn match_average(held: &[&Lot], units_to_sell: Units, total_held: Decimal) -> Vec<MatchedLot> {
    let ratio = units_to_sell.raw() / total_held;
    held.iter()
        .filter(|l| !l.units_remaining.is_zero())
        .map(|lot| {
            let units_matched = Units::new(lot.units_remaining.raw() * ratio);
            let cost_matched = Money::new(lot.cost_per_unit.raw() * units_matched.raw());
            MatchedLot {
                lot_id: lot.id,
                units_matched,
                cost_matched,
                acquisition_date: lot.acquisition_date,
            }
        })
        .collect()
}

/// Mutating: consumes `units_remaining` on each matched lot. Callers
/// must only invoke this after the corresponding sell journal has been
/// inserted in the same transaction, per §5's ordering guarantee.
pub fn deplete_lots(tx: &Transaction<'_>, result: &CostBasisResult) -> LedgerResult<()> {
    for matched in &result.matched_lots {
        let current: String = tx
            .query_row(
                "SELECT units_remaining FROM cost_basis_lots WHERE id = ?1",
                [matched.lot_id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(ledger_store::from_rusqlite)?
            .ok_or_else(|| LedgerError::not_found(format!("lot {}", matched.lot_id)))?;
        let current_units = Units::new(
            current
                .parse::<Decimal>()
                .map_err(|e| LedgerError::StorageError(e.to_string()))?,
        );
        let updated = current_units - matched.units_matched;
        if updated.is_negative() {
            return Err(LedgerError::AccountingBalanceError {
                key: matched.lot_id.to_string(),
                ledger_units: updated.raw(),
                lot_units: current_units.raw(),
            });
        }
        tx.execute(
            "UPDATE cost_basis_lots SET units_remaining = ?1 WHERE id = ?2",
            rusqlite::params![updated.raw().to_string(), matched.lot_id.0],
        )
        .map_err(ledger_store::from_rusqlite)?;
    }
    Ok(())
}

/// Raises `AccountingBalanceError` if the sum of `units_remaining` for
/// this key drifts from `expected_units` by more than `tol`.
pub fn validate_ledger_sync(
    tx: &Transaction<'_>,
    user_id: UserId,
    asset_type: AssetClass,
    symbol: &str,
    expected_units: Units,
    tol: Decimal,
) -> LedgerResult<()> {
    let lots = load_lots_for_key(tx, user_id, asset_type, symbol)?;
    let lot_units: Decimal = lots.iter().map(|l| l.units_remaining.raw()).sum();
    if (lot_units - expected_units.raw()).abs() > tol {
        return Err(LedgerError::AccountingBalanceError {
            key: format!("{user_id}:{}:{symbol}", asset_type_to_str(asset_type)),
            ledger_units: expected_units.raw(),
            lot_units,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn fifo_consumes_oldest_lot_first() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "INFY",
                    date("2023-01-01"),
                    Units::new(dec!(100)),
                    Money::new(dec!(1000)),
                    None,
                    "INR",
                )?;
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "INFY",
                    date("2023-06-01"),
                    Units::new(dec!(100)),
                    Money::new(dec!(2000)),
                    None,
                    "INR",
                )?;

                let result = calculate_cost_basis(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "INFY",
                    Units::new(dec!(100)),
                    date("2024-01-01"),
                    CostBasisMethod::Fifo,
                )?;
                assert_eq!(result.total_cost_basis, Money::new(dec!(1000)));
                assert_eq!(result.matched_lots.len(), 1);

                deplete_lots(tx, &result)?;
                validate_ledger_sync(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "INFY",
                    Units::new(dec!(100)),
                    dec!(0.01),
                )
            })
            .unwrap();
    }

    #[test]
    fn average_cost_weights_across_lots() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "TCS",
                    date("2023-01-01"),
                    Units::new(dec!(100)),
                    Money::new(dec!(1000)),
                    None,
                    "INR",
                )?;
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "TCS",
                    date("2023-06-01"),
                    Units::new(dec!(100)),
                    Money::new(dec!(2000)),
                    None,
                    "INR",
                )?;

                let result = calculate_cost_basis(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "TCS",
                    Units::new(dec!(100)),
                    date("2024-01-01"),
                    CostBasisMethod::Average,
                )?;
                assert_eq!(result.total_cost_basis, Money::new(dec!(1500)));
                assert_eq!(result.matched_lots.len(), 2);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn selling_more_than_held_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "WIPRO",
                    date("2023-01-01"),
                    Units::new(dec!(10)),
                    Money::new(dec!(100)),
                    None,
                    "INR",
                )
            })
            .unwrap();

        let result = store.with_tx(|tx| {
            calculate_cost_basis(
                tx,
                UserId(1),
                AssetClass::IndianStock,
                "WIPRO",
                Units::new(dec!(20)),
                date("2024-01-01"),
                CostBasisMethod::Fifo,
            )
        });
        assert!(matches!(result, Err(LedgerError::InsufficientUnits { .. })));
    }

    #[test]
    fn holding_period_at_365_days_is_short_term_at_366_is_long_term() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "HDFC",
                    date("2023-01-01"),
                    Units::new(dec!(10)),
                    Money::new(dec!(100)),
                    None,
                    "INR",
                )?;
                let at_365 = calculate_cost_basis(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "HDFC",
                    Units::new(dec!(1)),
                    date("2024-01-01"),
                    CostBasisMethod::Fifo,
                )?;
                assert_eq!(at_365.holding_period_days, 365);
                assert!(!at_365.is_long_term());
                Ok(())
            })
            .unwrap();

        let store2 = Store::open_in_memory().unwrap();
        store2
            .with_tx(|tx| {
                record_purchase(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "HDFC",
                    date("2023-01-01"),
                    Units::new(dec!(10)),
                    Money::new(dec!(100)),
                    None,
                    "INR",
                )?;
                let at_366 = calculate_cost_basis(
                    tx,
                    UserId(1),
                    AssetClass::IndianStock,
                    "HDFC",
                    Units::new(dec!(1)),
                    date("2024-01-02"),
                    CostBasisMethod::Fifo,
                )?;
                assert_eq!(at_366.holding_period_days, 366);
                assert!(at_366.is_long_term());
                Ok(())
            })
            .unwrap();
    }
}
