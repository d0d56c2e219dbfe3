//! Chart of accounts, posting rules, and double-entry journal
//! construction and persistence (§4.2).

pub mod chart;
pub mod journal;
pub mod posting_rules;
pub mod repository;

pub use chart::{Account, AccountType, ChartOfAccounts};
pub use journal::{Journal, JournalLeg};
pub use posting_rules::resolve_simple_posting;
pub use repository::{post, post_in_tx, PostOutcome};
