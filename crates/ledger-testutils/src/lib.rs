//! # ledger-testutils
//!
//! Fixture builders, balanced-journal/trial-balance assertion macros,
//! and an in-memory balance tracker shared by the workspace's crate
//! test suites.

pub mod assertions;
pub mod fixtures;
pub mod mocks;
