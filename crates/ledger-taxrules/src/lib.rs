//! The Tax-Rules Service (§4.7): a pure, cached reader over the rate
//! tables (`income_tax_slabs`, `capital_gains_rates`, `standard_deductions`,
//! `surcharge_rates`, `cess_rates`, `rebate_limits`, `chapter_via_limits`,
//! `dtaa_rates`). No tax arithmetic lives here — `ledger-tax` applies these
//! rates; this crate only fetches them.

pub mod rates;
pub mod service;

pub use rates::{CapitalGainsRate, RebateLimit, SurchargeBracket, TaxSlab};
pub use service::TaxRulesService;
