//! Enumerations shared across the ledger: asset classes, transaction
//! kinds, conflict policy, holding-period classification, and the
//! reconciliation vocabulary.

use serde::{Deserialize, Serialize};

/// The asset classes the ledger tracks cost-basis lots and holdings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    EquityMutualFund,
    DebtMutualFund,
    IndianStock,
    ForeignStock,
    Rsu,
    Espp,
    SovereignGoldBond,
    Ppf,
    Epf,
    Nps,
    Bank,
    Other,
}

impl AssetClass {
    /// Whether this class gets the 365-day equity/Indian-stock threshold
    /// (as opposed to the 730-day debt/foreign threshold), per §4.3.
    pub fn is_equity_like(&self) -> bool {
        matches!(self, AssetClass::EquityMutualFund | AssetClass::IndianStock)
    }

    /// Strictly-greater-than day count that separates short-term from
    /// long-term holding for this asset class.
    pub fn holding_period_threshold_days(&self) -> i64 {
        match self {
            AssetClass::EquityMutualFund | AssetClass::IndianStock => 365,
            AssetClass::DebtMutualFund => 730,
            AssetClass::ForeignStock | AssetClass::Rsu | AssetClass::Espp => 730,
            _ => 365,
        }
    }

    /// Whether sales of this asset class are eligible for the 31-Jan-2018
    /// grandfathering rule (equity-only per §4.3).
    pub fn is_grandfathering_eligible(&self) -> bool {
        matches!(self, AssetClass::EquityMutualFund | AssetClass::IndianStock)
    }

    /// The stable string this class is stored as in `asset_type`/`asset_class`
    /// columns across the schema.
    pub fn code(&self) -> &'static str {
        match self {
            AssetClass::EquityMutualFund => "EQUITY_MF",
            AssetClass::DebtMutualFund => "DEBT_MF",
            AssetClass::IndianStock => "INDIAN_STOCK",
            AssetClass::ForeignStock => "FOREIGN_STOCK",
            AssetClass::Rsu => "RSU",
            AssetClass::Espp => "ESPP",
            AssetClass::SovereignGoldBond => "SGB",
            AssetClass::Ppf => "PPF",
            AssetClass::Epf => "EPF",
            AssetClass::Nps => "NPS",
            AssetClass::Bank => "BANK",
            AssetClass::Other => "OTHER",
        }
    }

    pub fn from_code(s: &str) -> Option<AssetClass> {
        Some(match s {
            "EQUITY_MF" => AssetClass::EquityMutualFund,
            "DEBT_MF" => AssetClass::DebtMutualFund,
            "INDIAN_STOCK" => AssetClass::IndianStock,
            "FOREIGN_STOCK" => AssetClass::ForeignStock,
            "RSU" => AssetClass::Rsu,
            "ESPP" => AssetClass::Espp,
            "SGB" => AssetClass::SovereignGoldBond,
            "PPF" => AssetClass::Ppf,
            "EPF" => AssetClass::Epf,
            "NPS" => AssetClass::Nps,
            "BANK" => AssetClass::Bank,
            "OTHER" => AssetClass::Other,
            _ => return None,
        })
    }
}

impl HoldingPeriod {
    /// The stable string this classification is stored as in
    /// `capital_gains_rates.term` and similar columns.
    pub fn code(&self) -> &'static str {
        match self {
            HoldingPeriod::ShortTerm => "SHORT",
            HoldingPeriod::LongTerm => "LONG",
        }
    }
}

/// The business-event kind a journal posting represents; posting rules
/// (§4.2) map `(event_kind, leg_role)` to account codes from this enum,
/// never the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnKind {
    StockBuy,
    StockSell,
    MfPurchase,
    MfRedemption,
    Dividend,
    InterestCredit,
    RsuVest,
    EsppPurchase,
    ForeignStockSale,
    PpfDeposit,
    PpfWithdrawal,
    EpfContribution,
    EpfWithdrawal,
    NpsContribution,
    NpsWithdrawal,
    BankFee,
    BankTransfer,
    TdsDeduction,
    AdvanceTaxPayment,
    CompensatingReversal,
}

/// How the transaction service should handle a natural-key collision when
/// upserting a denormalized asset row (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnConflict {
    /// Silently skip the insert; the existing row is authoritative.
    Ignore,
    /// Overwrite the existing row's data.
    Replace,
    /// Surface `DuplicateKey` to the caller.
    Fail,
}

/// Short-term vs long-term classification of a disposed holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

impl HoldingPeriod {
    pub fn classify(holding_days: i64, threshold_days: i64) -> HoldingPeriod {
        if holding_days > threshold_days {
            HoldingPeriod::LongTerm
        } else {
            HoldingPeriod::ShortTerm
        }
    }

    pub fn is_long_term(&self) -> bool {
        matches!(self, HoldingPeriod::LongTerm)
    }
}

/// Which tax regime a computation or rate-table row applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Old,
    New,
}

/// Outcome of comparing one golden-reference holding against the system's
/// computed holding for the same key (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Exact,
    WithinTolerance,
    Mismatch,
    MissingGolden,
    MissingSystem,
}

/// Severity assigned to a reconciliation event from the magnitude of its
/// difference (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Lifecycle of an open discrepancy tracked against a reconciliation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspenseStatus {
    Open,
    InProgress,
    Resolved,
    WrittenOff,
}

impl SuspenseStatus {
    pub fn can_transition_to(&self, next: SuspenseStatus) -> bool {
        use SuspenseStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (Open, Resolved)
                | (Open, WrittenOff)
                | (InProgress, Resolved)
                | (InProgress, WrittenOff)
                | (InProgress, Open)
        )
    }
}
