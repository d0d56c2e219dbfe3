//! Income aggregation, the advance-tax calculator, and DTAA/Form-67
//! foreign tax credit (§4.8). Reads rates through `ledger-taxrules`;
//! this crate owns the arithmetic, not the tables.

pub mod aggregator;
pub mod calculator;
pub mod dtaa;
pub mod income;

pub use aggregator::aggregate_income;
pub use calculator::{calculate_and_persist, AdvanceTaxResult};
pub use dtaa::{calculate_dividend_credit, calculate_interest_credit, DtaaCredit};
pub use income::{IncomeBucket, IncomeRecord};
