//! Authoritative-source resolution for a `(metric, asset_class)` pair
//! (§4.10), grounded on
//! `examples/original_source/src/pfas/services/golden_reference/truth_resolver.py`.
//! Precedence, highest first: config-file override (passed in by the
//! caller — this crate has no filesystem access of its own) > per-user
//! DB override (`truth_resolver_overrides`) > the in-code default table.

use ledger_domain::{AssetClass, LedgerResult, UserId};
use ledger_store::from_rusqlite;
use rusqlite::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    NetWorth,
    CapitalGains,
    Units,
    CostBasis,
}

impl Metric {
    fn as_str(&self) -> &'static str {
        match self {
            Metric::NetWorth => "net_worth",
            Metric::CapitalGains => "capital_gains",
            Metric::Units => "units",
            Metric::CostBasis => "cost_basis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum Source {
    NsdlCas,
    CdslCas,
    RtaCas,
    Broker,
    Depository,
    System,
}

impl Source {
    fn parse(s: &str) -> Option<Source> {
        match s {
            "nsdl_cas" => Some(Source::NsdlCas),
            "cdsl_cas" => Some(Source::CdslCas),
            "rta_cas" => Some(Source::RtaCas),
            "broker" => Some(Source::Broker),
            "depository" => Some(Source::Depository),
            "system" => Some(Source::System),
            _ => None,
        }
    }
}

/// Defaults mirror the original's hard-coded table: NSDL CAS is
/// authoritative for MF/stock net worth, the RTA/broker for realized
/// gains, the system's own cost-basis tracker for cost basis (nothing
/// external tracks our lot-level purchase history).
fn default_priority(metric: Metric, asset_class: AssetClass) -> Vec<Source> {
    use AssetClass::*;
    use Metric::*;
    match (metric, asset_class) {
        (NetWorth, EquityMutualFund | DebtMutualFund) => vec![Source::NsdlCas, Source::CdslCas, Source::RtaCas, Source::System],
        (NetWorth, IndianStock) => vec![Source::NsdlCas, Source::CdslCas, Source::Broker, Source::System],
        (NetWorth, Nps) => vec![Source::NsdlCas, Source::System],
        (NetWorth, ForeignStock | Rsu | Espp) => vec![Source::Broker, Source::System],
        (CapitalGains, EquityMutualFund | DebtMutualFund) => vec![Source::RtaCas, Source::NsdlCas, Source::System],
        (CapitalGains, IndianStock) => vec![Source::Broker, Source::NsdlCas, Source::System],
        (Units, EquityMutualFund | DebtMutualFund) => vec![Source::RtaCas, Source::NsdlCas, Source::System],
        (Units, IndianStock) => vec![Source::Depository, Source::Broker, Source::System],
        (CostBasis, EquityMutualFund | DebtMutualFund) => vec![Source::System, Source::RtaCas],
        (CostBasis, IndianStock) => vec![Source::System, Source::Broker],
        _ => vec![Source::System],
    }
}

/// Per-`(metric, asset_class)` config-file override, supplied by the
/// caller (this crate has no I/O of its own — loading the file is the
/// caller's job, matching how `ledger-config` is the one place this
/// workspace reads configuration from disk).
pub type ConfigOverrides = std::collections::HashMap<(Metric, AssetClass), Vec<Source>>;

pub fn source_priority(
    tx: &Transaction<'_>,
    user_id: UserId,
    metric: Metric,
    asset_class: AssetClass,
    config_overrides: Option<&ConfigOverrides>,
) -> LedgerResult<Vec<Source>> {
    if let Some(overrides) = config_overrides {
        if let Some(sources) = overrides.get(&(metric, asset_class)) {
            return Ok(sources.clone());
        }
    }

    let stored: Option<String> = tx
        .query_row(
            "SELECT source_order FROM truth_resolver_overrides WHERE user_id = ?1 AND metric = ?2 AND asset_class = ?3",
            rusqlite::params![user_id.0, metric.as_str(), asset_class.code()],
            |row| row.get(0),
        )
        .optional_or_none()
        .map_err(from_rusqlite)?;

    if let Some(stored) = stored {
        let sources: Vec<Source> = stored.split(',').filter_map(Source::parse).collect();
        if !sources.is_empty() {
            return Ok(sources);
        }
    }

    Ok(default_priority(metric, asset_class))
}

pub fn primary_source(
    tx: &Transaction<'_>,
    user_id: UserId,
    metric: Metric,
    asset_class: AssetClass,
    config_overrides: Option<&ConfigOverrides>,
) -> LedgerResult<Source> {
    Ok(source_priority(tx, user_id, metric, asset_class, config_overrides)?
        .into_iter()
        .next()
        .unwrap_or(Source::System))
}

trait OptionalOrNone<T> {
    fn optional_or_none(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalOrNone<T> for rusqlite::Result<T> {
    fn optional_or_none(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;

    #[test]
    fn defaults_to_nsdl_cas_for_mf_net_worth() {
        let store = Store::open_in_memory().unwrap();
        let source = store
            .with_tx(|tx| primary_source(tx, UserId(1), Metric::NetWorth, AssetClass::EquityMutualFund, None))
            .unwrap();
        assert_eq!(source, Source::NsdlCas);
    }

    #[test]
    fn a_db_override_takes_precedence_over_the_default() {
        let store = Store::open_in_memory().unwrap();
        let source = store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO truth_resolver_overrides (user_id, metric, asset_class, source_order) VALUES (1, 'net_worth', 'EQUITY_MF', 'system,rta_cas')",
                    [],
                )
                .unwrap();
                primary_source(tx, UserId(1), Metric::NetWorth, AssetClass::EquityMutualFund, None)
            })
            .unwrap();
        assert_eq!(source, Source::System);
    }

    #[test]
    fn a_config_file_override_beats_a_db_override() {
        let store = Store::open_in_memory().unwrap();
        let mut overrides = ConfigOverrides::new();
        overrides.insert((Metric::NetWorth, AssetClass::EquityMutualFund), vec![Source::Broker]);

        let source = store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO truth_resolver_overrides (user_id, metric, asset_class, source_order) VALUES (1, 'net_worth', 'EQUITY_MF', 'system')",
                    [],
                )
                .unwrap();
                primary_source(tx, UserId(1), Metric::NetWorth, AssetClass::EquityMutualFund, Some(&overrides))
            })
            .unwrap();
        assert_eq!(source, Source::Broker);
    }
}
