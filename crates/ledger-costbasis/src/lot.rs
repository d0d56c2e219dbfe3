//! A single purchase lot (§3: `Cost-Basis Lot`). Created on a buy
//! posting, mutated only in its `units_remaining` field on sells, never
//! deleted.

use std::str::FromStr;

use chrono::NaiveDate;
use ledger_domain::{AssetClass, LedgerError, LedgerResult, LotId, Money, UserId, Units};
use rusqlite::Row;

#[derive(Debug, Clone)]
pub struct Lot {
    pub id: LotId,
    pub user_id: UserId,
    pub asset_type: AssetClass,
    pub symbol: String,
    pub acquisition_date: NaiveDate,
    pub units_acquired: Units,
    pub units_remaining: Units,
    pub cost_per_unit: Money,
    pub total_cost: Money,
    pub currency: String,
    pub reference: Option<String>,
}

pub(crate) fn asset_type_to_str(asset_type: AssetClass) -> &'static str {
    asset_type.code()
}

pub(crate) fn asset_type_from_str(s: &str) -> LedgerResult<AssetClass> {
    AssetClass::from_code(s).ok_or_else(|| LedgerError::invalid(format!("unknown asset_type {s}")))
}

impl Lot {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let parse_decimal = |s: String| -> rusqlite::Result<rust_decimal::Decimal> {
            rust_decimal::Decimal::from_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })
        };
        let asset_type_str: String = row.get("asset_type")?;
        let asset_type = asset_type_from_str(&asset_type_str)
            .map_err(|e| rusqlite::Error::InvalidColumnName(e.to_string()))?;
        let acquisition_date: String = row.get("acquisition_date")?;
        Ok(Lot {
            id: LotId(row.get("id")?),
            user_id: UserId(row.get("user_id")?),
            asset_type,
            symbol: row.get("symbol")?,
            acquisition_date: NaiveDate::parse_from_str(&acquisition_date, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::InvalidColumnName(e.to_string()))?,
            units_acquired: Units::new(parse_decimal(row.get("units_acquired")?)?),
            units_remaining: Units::new(parse_decimal(row.get("units_remaining")?)?),
            cost_per_unit: Money::new(parse_decimal(row.get("cost_per_unit")?)?),
            total_cost: Money::new(parse_decimal(row.get("total_cost")?)?),
            currency: row.get("currency")?,
            reference: row.get("reference")?,
        })
    }
}
