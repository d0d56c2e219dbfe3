//! # ledger-valuation
//!
//! Point-in-time views over the ledger's asset tables: balance sheet,
//! cash flow statement, per-asset-class portfolio XIRR, and loan
//! amortization (§4.9). Nothing here writes a journal entry — these are
//! read (and, for the balance sheet, snapshot-persisting) views, not
//! part of the transactional write path.

pub mod balance_sheet;
pub mod cash_flow;
pub mod liabilities;
pub mod xirr;

pub use balance_sheet::{compute_balance_sheet, persist_snapshot, AssetHolding, BalanceSheet, LoanBalance};
pub use cash_flow::{compute_cash_flow, Activity, ActivityTotals, CashFlowStatement};
pub use liabilities::{amortization_schedule, emi, record_liability_event, AmortizationRow};
pub use xirr::{portfolio_xirr, xirr, AssetClassXirr, DatedCashFlow};
