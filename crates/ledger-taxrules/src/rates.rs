//! Row types read out of the rate tables (§4.7). None of these carry
//! behavior beyond simple accessors — the calculator in `ledger-tax`
//! applies them, this crate only fetches them.

use ledger_domain::Money;
use rust_decimal::Decimal;

/// One bracket of `income_tax_slabs`, e.g. "10,00,000 to 12,50,000 at 20%".
#[derive(Debug, Clone, PartialEq)]
pub struct TaxSlab {
    pub lower_bound: Money,
    pub upper_bound: Option<Money>,
    pub rate: Decimal,
}

/// A row of `capital_gains_rates`: the rate and any per-year exemption
/// (e.g. the equity-LTCG ₹1,25,000 exemption) for one `(asset_class, term)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalGainsRate {
    pub rate: Decimal,
    pub exemption_limit: Money,
}

/// A row of `surcharge_rates`: the marginal rate for one income bracket,
/// with an optional cap (the equity-income 15% surcharge ceiling).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurchargeBracket {
    pub lower_bound: Money,
    pub upper_bound: Option<Money>,
    pub rate: Decimal,
    pub rate_cap: Option<Decimal>,
}

/// `rebate_limits`: the §87A income ceiling and the maximum rebate amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebateLimit {
    pub income_cap: Money,
    pub max_rebate: Money,
}
