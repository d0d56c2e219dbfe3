//! Validation for the reconciliation config schema.

use ledger_domain::{LedgerError, LedgerResult};
use rust_decimal::Decimal;

use crate::schema::{ReconciliationConfig, ToleranceConfig};

impl ToleranceConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        let zero = Decimal::ZERO;
        if self.absolute_tolerance < zero
            || self.percentage_tolerance < zero
            || self.warning_threshold < zero
            || self.error_threshold < zero
            || self.critical_threshold < zero
        {
            return Err(LedgerError::invalid(
                "tolerance and severity thresholds must be non-negative",
            ));
        }
        if !(self.warning_threshold <= self.error_threshold
            && self.error_threshold <= self.critical_threshold)
        {
            return Err(LedgerError::invalid(
                "severity thresholds must be ordered warning <= error <= critical",
            ));
        }
        Ok(())
    }
}

impl ReconciliationConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        self.default_tolerance.validate()?;
        for tol in self.tolerance_overrides.values() {
            tol.validate()?;
        }
        if self.frequency_days == 0 {
            return Err(LedgerError::invalid(
                "reconciliation frequency_days must be positive",
            ));
        }
        Ok(())
    }
}
