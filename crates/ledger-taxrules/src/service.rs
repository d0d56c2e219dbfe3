//! A pure reader over the rule tables (§4.7): no arithmetic lives here,
//! only lookups, each backed by a small write-once-per-key cache (§5 —
//! "the Tax-Rules Service in-memory cache; the latter is write-once-per-key").
//!
//! Every accessor takes `&rusqlite::Connection` rather than owning a
//! [`ledger_store::Store`] of its own, so a caller already holding an open
//! transaction (the advance-tax calculator, per §4.8: "executed in one
//! transaction") can pass that same handle in without risking a second
//! pooled connection deadlocking against the first.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use ledger_domain::{AssetClass, FinancialYear, HoldingPeriod, LedgerError, LedgerResult, Money, Regime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::trace;

use crate::rates::{CapitalGainsRate, RebateLimit, SurchargeBracket, TaxSlab};

fn regime_code(regime: Regime) -> &'static str {
    match regime {
        Regime::Old => "OLD",
        Regime::New => "NEW",
    }
}

fn parse_decimal(s: &str) -> LedgerResult<Decimal> {
    Decimal::from_str(s).map_err(|e| LedgerError::invalid(format!("bad decimal {s}: {e}")))
}

fn parse_money(s: &str) -> LedgerResult<Money> {
    Ok(Money::new(parse_decimal(s)?))
}

fn parse_opt_money(s: Option<String>) -> LedgerResult<Option<Money>> {
    s.map(|s| parse_money(&s)).transpose()
}

fn parse_opt_decimal(s: Option<String>) -> LedgerResult<Option<Decimal>> {
    s.map(|s| parse_decimal(&s)).transpose()
}

type SlabKey = (FinancialYear, Regime);
type CgKey = (FinancialYear, AssetClass, HoldingPeriod);
type DeductionKey = (FinancialYear, Regime, String);
type SurchargeKey = (FinancialYear, Regime, String);
type RebateKey = (FinancialYear, Regime);
type ChapterViaKey = (FinancialYear, String);
type DtaaKey = (String, String);

#[derive(Default)]
struct Caches {
    slabs: HashMap<SlabKey, Vec<TaxSlab>>,
    cg_rates: HashMap<CgKey, CapitalGainsRate>,
    deductions: HashMap<DeductionKey, Money>,
    surcharge: HashMap<SurchargeKey, Vec<SurchargeBracket>>,
    cess: HashMap<FinancialYear, Decimal>,
    rebate: HashMap<RebateKey, RebateLimit>,
    chapter_via: HashMap<ChapterViaKey, Money>,
    dtaa: HashMap<DtaaKey, Decimal>,
}

/// The tax-rules reader. Created once per process (or per test); every
/// public method is `&self`, so it is typically held behind an `Arc` by
/// callers that need it from multiple places.
#[derive(Default)]
pub struct TaxRulesService {
    cache: Mutex<Caches>,
}

impl TaxRulesService {
    pub fn new() -> Self {
        TaxRulesService::default()
    }

    /// Ordered income-tax slabs for one `(financial_year, regime)`.
    pub fn get_tax_slabs(&self, conn: &Connection, fy: FinancialYear, regime: Regime) -> LedgerResult<Vec<TaxSlab>> {
        let key = (fy, regime);
        if let Some(hit) = self.cache.lock().unwrap().slabs.get(&key) {
            return Ok(hit.clone());
        }
        let mut stmt = conn
            .prepare(
                "SELECT lower_bound, upper_bound, rate FROM income_tax_slabs
                 WHERE financial_year = ?1 AND regime = ?2 ORDER BY slab_order ASC",
            )
            .map_err(ledger_store::from_rusqlite)?;
        let rows = stmt
            .query_map(rusqlite::params![fy.to_string(), regime_code(regime)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(ledger_store::from_rusqlite)?;
        let mut slabs = Vec::new();
        for row in rows {
            let (lower, upper, rate) = row.map_err(ledger_store::from_rusqlite)?;
            slabs.push(TaxSlab {
                lower_bound: parse_money(&lower)?,
                upper_bound: parse_opt_money(upper)?,
                rate: parse_decimal(&rate)?,
            });
        }
        trace!(fy = %fy, regime = ?regime, count = slabs.len(), "loaded tax slabs");
        self.cache.lock().unwrap().slabs.insert(key, slabs.clone());
        Ok(slabs)
    }

    /// The capital-gains rate and exemption for one `(asset_class, term)`.
    /// Returns `Ok(None)` when the table has no row for this key — callers
    /// treat that as "this disposal is taxed at slab rate, not specially".
    pub fn get_cg_rate(
        &self,
        conn: &Connection,
        fy: FinancialYear,
        asset_class: AssetClass,
        term: HoldingPeriod,
    ) -> LedgerResult<Option<CapitalGainsRate>> {
        let key = (fy, asset_class, term);
        if let Some(hit) = self.cache.lock().unwrap().cg_rates.get(&key) {
            return Ok(Some(*hit));
        }
        let found: Option<(String, String)> = conn
            .query_row(
                "SELECT rate, exemption_limit FROM capital_gains_rates
                 WHERE financial_year = ?1 AND asset_class = ?2 AND term = ?3",
                rusqlite::params![fy.to_string(), asset_class.code(), term.code()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional_err()?;
        let Some((rate, exemption)) = found else {
            return Ok(None);
        };
        let parsed = CapitalGainsRate {
            rate: parse_decimal(&rate)?,
            exemption_limit: parse_money(&exemption)?,
        };
        self.cache.lock().unwrap().cg_rates.insert(key, parsed);
        Ok(Some(parsed))
    }

    /// A standard-deduction amount, e.g. the salary standard deduction.
    /// Returns `Money::ZERO` when the table has no matching row.
    pub fn get_standard_deduction(
        &self,
        conn: &Connection,
        fy: FinancialYear,
        regime: Regime,
        income_type: &str,
    ) -> LedgerResult<Money> {
        let key = (fy, regime, income_type.to_string());
        if let Some(hit) = self.cache.lock().unwrap().deductions.get(&key) {
            return Ok(*hit);
        }
        let found: Option<String> = conn
            .query_row(
                "SELECT amount FROM standard_deductions
                 WHERE financial_year = ?1 AND regime = ?2 AND income_type = ?3",
                rusqlite::params![fy.to_string(), regime_code(regime), income_type],
                |row| row.get(0),
            )
            .optional_err()?;
        let amount = match found {
            Some(s) => parse_money(&s)?,
            None => Money::ZERO,
        };
        self.cache.lock().unwrap().deductions.insert(key, amount);
        Ok(amount)
    }

    /// The surcharge rate applicable at `income`, for `income_type`
    /// ("NORMAL" or "EQUITY_CG" — the latter carries the 15%-cap row per
    /// §4.7 "surcharge rate for equity-capped-at-15%").
    pub fn get_surcharge_rate(
        &self,
        conn: &Connection,
        fy: FinancialYear,
        regime: Regime,
        income_type: &str,
        income: Money,
    ) -> LedgerResult<Decimal> {
        let key = (fy, regime, income_type.to_string());
        let brackets = if let Some(hit) = self.cache.lock().unwrap().surcharge.get(&key) {
            hit.clone()
        } else {
            let mut stmt = conn
                .prepare(
                    "SELECT lower_bound, upper_bound, rate, rate_cap FROM surcharge_rates
                     WHERE financial_year = ?1 AND regime = ?2 AND income_type = ?3
                     ORDER BY lower_bound ASC",
                )
                .map_err(ledger_store::from_rusqlite)?;
            let rows = stmt
                .query_map(rusqlite::params![fy.to_string(), regime_code(regime), income_type], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })
                .map_err(ledger_store::from_rusqlite)?;
            let mut brackets = Vec::new();
            for row in rows {
                let (lower, upper, rate, cap) = row.map_err(ledger_store::from_rusqlite)?;
                brackets.push(SurchargeBracket {
                    lower_bound: parse_money(&lower)?,
                    upper_bound: parse_opt_money(upper)?,
                    rate: parse_decimal(&rate)?,
                    rate_cap: parse_opt_decimal(cap)?,
                });
            }
            self.cache.lock().unwrap().surcharge.insert(key, brackets.clone());
            brackets
        };

        for bracket in brackets.iter().rev() {
            if income.raw() >= bracket.lower_bound.raw()
                && bracket.upper_bound.map(|u| income.raw() <= u.raw()).unwrap_or(true)
            {
                return Ok(match bracket.rate_cap {
                    Some(cap) if bracket.rate > cap => cap,
                    _ => bracket.rate,
                });
            }
        }
        Ok(Decimal::ZERO)
    }

    /// The health-and-education cess rate for a financial year (flat 4%
    /// since FY 2018-19, but read from the table rather than hard-coded).
    pub fn get_cess_rate(&self, conn: &Connection, fy: FinancialYear) -> LedgerResult<Decimal> {
        if let Some(hit) = self.cache.lock().unwrap().cess.get(&fy) {
            return Ok(*hit);
        }
        let rate: String = conn
            .query_row(
                "SELECT rate FROM cess_rates WHERE financial_year = ?1",
                [fy.to_string()],
                |row| row.get(0),
            )
            .map_err(ledger_store::from_rusqlite)?;
        let rate = parse_decimal(&rate)?;
        self.cache.lock().unwrap().cess.insert(fy, rate);
        Ok(rate)
    }

    /// The §87A rebate income cap and maximum rebate for `(fy, regime)`.
    pub fn get_rebate_limit(&self, conn: &Connection, fy: FinancialYear, regime: Regime) -> LedgerResult<RebateLimit> {
        let key = (fy, regime);
        if let Some(hit) = self.cache.lock().unwrap().rebate.get(&key) {
            return Ok(*hit);
        }
        let (income_cap, max_rebate): (String, String) = conn
            .query_row(
                "SELECT income_cap, max_rebate FROM rebate_limits WHERE financial_year = ?1 AND regime = ?2",
                rusqlite::params![fy.to_string(), regime_code(regime)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(ledger_store::from_rusqlite)?;
        let limit = RebateLimit {
            income_cap: parse_money(&income_cap)?,
            max_rebate: parse_money(&max_rebate)?,
        };
        self.cache.lock().unwrap().rebate.insert(key, limit);
        Ok(limit)
    }

    /// A Chapter VI-A section limit (e.g. 80C, 80TTA).
    pub fn get_chapter_via_limit(&self, conn: &Connection, fy: FinancialYear, section: &str) -> LedgerResult<Money> {
        let key = (fy, section.to_string());
        if let Some(hit) = self.cache.lock().unwrap().chapter_via.get(&key) {
            return Ok(*hit);
        }
        let found: Option<String> = conn
            .query_row(
                "SELECT limit_amount FROM chapter_via_limits WHERE financial_year = ?1 AND section = ?2",
                rusqlite::params![fy.to_string(), section],
                |row| row.get(0),
            )
            .optional_err()?;
        let amount = match found {
            Some(s) => parse_money(&s)?,
            None => Money::ZERO,
        };
        self.cache.lock().unwrap().chapter_via.insert(key, amount);
        Ok(amount)
    }

    /// The DTAA treaty withholding-rate ceiling for `(country, income_type)`,
    /// read from `dtaa_rates` rather than hard-coded per §9's design note.
    pub fn get_dtaa_rate(&self, conn: &Connection, country: &str, income_type: &str) -> LedgerResult<Option<Decimal>> {
        let key = (country.to_string(), income_type.to_string());
        if let Some(hit) = self.cache.lock().unwrap().dtaa.get(&key) {
            return Ok(Some(*hit));
        }
        let found: Option<String> = conn
            .query_row(
                "SELECT treaty_rate FROM dtaa_rates WHERE country = ?1 AND income_type = ?2",
                rusqlite::params![country, income_type],
                |row| row.get(0),
            )
            .optional_err()?;
        let Some(rate) = found else { return Ok(None) };
        let rate = parse_decimal(&rate)?;
        self.cache.lock().unwrap().dtaa.insert(key, rate);
        Ok(Some(rate))
    }
}

trait OptionalErr<T> {
    fn optional_err(self) -> LedgerResult<Option<T>>;
}

impl<T> OptionalErr<T> for Result<T, rusqlite::Error> {
    fn optional_err(self) -> LedgerResult<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ledger_store::from_rusqlite(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;

    fn seed(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO income_tax_slabs (financial_year, regime, slab_order, lower_bound, upper_bound, rate)
             VALUES ('2024-25','NEW',1,'0','300000','0'),
                    ('2024-25','NEW',2,'300000','700000','0.05'),
                    ('2024-25','NEW',3,'700000',NULL,'0.10');
             INSERT INTO capital_gains_rates (financial_year, asset_class, term, rate, exemption_limit)
             VALUES ('2024-25','INDIAN_STOCK','LONG','0.125','125000');
             INSERT INTO cess_rates (financial_year, rate) VALUES ('2024-25', '0.04');
             INSERT INTO rebate_limits (financial_year, regime, income_cap, max_rebate)
             VALUES ('2024-25','NEW','700000','25000');
             INSERT INTO surcharge_rates (financial_year, regime, income_type, lower_bound, upper_bound, rate, rate_cap)
             VALUES ('2024-25','NEW','NORMAL','5000000',NULL,'0.37', NULL),
                    ('2024-25','NEW','EQUITY_CG','5000000',NULL,'0.37','0.15');
             INSERT INTO dtaa_rates (country, income_type, treaty_rate) VALUES ('US','DIVIDEND','0.25');",
        )
        .unwrap();
    }

    #[test]
    fn slabs_come_back_ordered_and_are_cached() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        seed(&conn);
        let service = TaxRulesService::new();
        let slabs = service.get_tax_slabs(&conn, FinancialYear::new(2024), Regime::New).unwrap();
        assert_eq!(slabs.len(), 3);
        assert!(slabs[2].upper_bound.is_none());
        let again = service.get_tax_slabs(&conn, FinancialYear::new(2024), Regime::New).unwrap();
        assert_eq!(slabs, again);
    }

    #[test]
    fn cg_rate_missing_key_is_none() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        seed(&conn);
        let service = TaxRulesService::new();
        let rate = service
            .get_cg_rate(&conn, FinancialYear::new(2024), AssetClass::ForeignStock, HoldingPeriod::LongTerm)
            .unwrap();
        assert!(rate.is_none());
    }

    #[test]
    fn surcharge_rate_caps_for_equity_income() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        seed(&conn);
        let service = TaxRulesService::new();
        let income = Money::new(Decimal::from(6_000_000));
        let normal = service
            .get_surcharge_rate(&conn, FinancialYear::new(2024), Regime::New, "NORMAL", income)
            .unwrap();
        let equity = service
            .get_surcharge_rate(&conn, FinancialYear::new(2024), Regime::New, "EQUITY_CG", income)
            .unwrap();
        assert_eq!(normal, Decimal::new(37, 2));
        assert_eq!(equity, Decimal::new(15, 2));
    }

    #[test]
    fn dtaa_rate_found_and_missing() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        seed(&conn);
        let service = TaxRulesService::new();
        assert_eq!(
            service.get_dtaa_rate(&conn, "US", "DIVIDEND").unwrap(),
            Some(Decimal::new(25, 2))
        );
        assert_eq!(service.get_dtaa_rate(&conn, "UK", "ROYALTY").unwrap(), None);
    }
}
