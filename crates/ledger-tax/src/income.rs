//! The income buckets the advance-tax calculator categorizes into (§4.8
//! step 1). Each bucket carries the string this crate writes to
//! `user_income_summary.applicable_tax_rate_type` and
//! `advance_tax_computations`.

use ledger_domain::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeBucket {
    Salary,
    StcgEquity,
    LtcgEquity,
    CapitalGainsSlab,
    HouseProperty,
    Business,
    OtherSources,
}

impl IncomeBucket {
    pub fn code(&self) -> &'static str {
        match self {
            IncomeBucket::Salary => "SALARY",
            IncomeBucket::StcgEquity => "STCG_EQUITY",
            IncomeBucket::LtcgEquity => "LTCG_EQUITY",
            IncomeBucket::CapitalGainsSlab => "CG_SLAB",
            IncomeBucket::HouseProperty => "HOUSE_PROPERTY",
            IncomeBucket::Business => "BUSINESS",
            IncomeBucket::OtherSources => "OTHER_SOURCES",
        }
    }
}

/// One line of income for a financial year, whether read from
/// `user_income_summary` or derived by scanning source tables.
#[derive(Debug, Clone)]
pub struct IncomeRecord {
    pub bucket: IncomeBucket,
    pub sub_classification: String,
    pub sub_grouping: String,
    pub gross: Money,
    pub deductions: Money,
    pub taxable: Money,
    pub tds: Money,
}

impl IncomeRecord {
    pub fn new(bucket: IncomeBucket, sub_classification: impl Into<String>, sub_grouping: impl Into<String>, gross: Money) -> Self {
        IncomeRecord {
            bucket,
            sub_classification: sub_classification.into(),
            sub_grouping: sub_grouping.into(),
            gross,
            deductions: Money::ZERO,
            taxable: gross,
            tds: Money::ZERO,
        }
    }
}
