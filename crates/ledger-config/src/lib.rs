//! # ledger-config
//!
//! Schema for the two optional files a user's config directory may carry
//! (§6): `reconciliation.json` (mode, frequency, tolerances, thresholds,
//! enabled asset classes) and `passwords.json` (dot-notated keys such as
//! `golden.nsdl`). Both are optional and every field has a code-level
//! default; loading a config directory from disk and wiring it into a CLI
//! is an external collaborator's job, not this core's.

pub mod schema;
pub mod validation;

pub use schema::*;
pub use validation::*;
