//! Config-directory schema: `reconciliation.json` and `passwords.json`.

use std::collections::HashMap;

use ledger_domain::AssetClass;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// When the Golden-Reference Engine runs reconciliation for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationMode {
    /// Only runs when explicitly invoked.
    Manual,
    /// Runs on a cadence described by `frequency`.
    Scheduled,
    /// Runs at the end of every batch ingestion.
    OnIngest,
}

impl Default for ReconciliationMode {
    fn default() -> Self {
        ReconciliationMode::Manual
    }
}

/// Per-asset-class tolerance and severity thresholds used by the cross
/// correlator (§4.10). `absolute_tolerance` and `percentage_tolerance` are
/// OR'd together: a diff within either counts as `WITHIN_TOLERANCE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    pub absolute_tolerance: Decimal,
    pub percentage_tolerance: Decimal,
    pub warning_threshold: Decimal,
    pub error_threshold: Decimal,
    pub critical_threshold: Decimal,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        ToleranceConfig {
            absolute_tolerance: Decimal::new(1, 2),   // 0.01
            percentage_tolerance: Decimal::new(5, 3), // 0.005 (0.5%)
            warning_threshold: Decimal::new(100, 0),
            error_threshold: Decimal::new(1_000, 0),
            critical_threshold: Decimal::new(10_000, 0),
        }
    }
}

/// Per-user reconciliation settings, read from `reconciliation.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    #[serde(default)]
    pub mode: ReconciliationMode,
    /// Cadence in days, only consulted when `mode = Scheduled`.
    #[serde(default = "default_frequency_days")]
    pub frequency_days: u32,
    #[serde(default)]
    pub default_tolerance: ToleranceConfig,
    #[serde(default)]
    pub tolerance_overrides: HashMap<AssetClass, ToleranceConfig>,
    #[serde(default)]
    pub enabled_asset_classes: Option<Vec<AssetClass>>,
    #[serde(default = "default_true")]
    pub suspense_enabled: bool,
}

fn default_frequency_days() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        ReconciliationConfig {
            mode: ReconciliationMode::default(),
            frequency_days: default_frequency_days(),
            default_tolerance: ToleranceConfig::default(),
            tolerance_overrides: HashMap::new(),
            enabled_asset_classes: None,
            suspense_enabled: true,
        }
    }
}

impl ReconciliationConfig {
    pub fn tolerance_for(&self, asset_class: AssetClass) -> &ToleranceConfig {
        self.tolerance_overrides
            .get(&asset_class)
            .unwrap_or(&self.default_tolerance)
    }

    pub fn is_enabled(&self, asset_class: AssetClass) -> bool {
        match &self.enabled_asset_classes {
            None => true,
            Some(list) => list.contains(&asset_class),
        }
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Dot-notated password lookup, e.g. `golden.nsdl` -> the NSDL CAS PDF
/// password. Read from `passwords.json`; empty by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

impl PasswordConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Look up a dot-notated key, e.g. `"golden.nsdl"`.
    pub fn get(&self, dotted_key: &str) -> Option<&str> {
        self.entries.get(dotted_key).map(|s| s.as_str())
    }

    pub fn insert(&mut self, dotted_key: impl Into<String>, password: impl Into<String>) {
        self.entries.insert(dotted_key.into(), password.into());
    }
}

/// Precedence order for config-file overrides versus the `truth_resolver`
/// database rule table (§4.10): config-file overrides always win.
pub const CONFIG_OVERRIDES_DB: bool = true;
