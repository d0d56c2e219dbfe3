//! A header-indexed row with case-insensitive, multi-candidate-name
//! lookup — the shape every format parser pulls fields out of, grounded
//! on `_get_column_value`'s "try each candidate column name in turn,
//! skip blank/NaN" pattern used across the original RTA parsers.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Row {
    by_lower_header: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut row = Row::new();
        for (header, value) in pairs {
            row.insert(&header, value);
        }
        row
    }

    pub fn insert(&mut self, header: &str, value: String) {
        let key = header.trim().to_lowercase();
        let value = value.trim().to_string();
        if value.is_empty() || value.eq_ignore_ascii_case("nan") {
            return;
        }
        self.by_lower_header.insert(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.by_lower_header.is_empty()
    }

    /// Returns the value of the first candidate header name present in
    /// this row, matched case-insensitively after trimming. Candidates
    /// are tried in priority order, the same fallback-list idiom the
    /// original parsers use per field (date, description, amount...).
    pub fn get_by_any(&self, candidates: &[&str]) -> Option<&str> {
        for candidate in candidates {
            let key = candidate.trim().to_lowercase();
            if let Some(v) = self.by_lower_header.get(&key) {
                return Some(v.as_str());
            }
        }
        None
    }

    pub fn get_decimal_by_any(&self, candidates: &[&str]) -> Option<rust_decimal::Decimal> {
        self.get_by_any(candidates)
            .and_then(|s| s.replace(',', "").parse::<rust_decimal::Decimal>().ok())
    }

    pub fn get_date_by_any(&self, candidates: &[&str], formats: &[&str]) -> Option<chrono::NaiveDate> {
        let raw = self.get_by_any(candidates)?;
        for fmt in formats {
            if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, fmt) {
                return Some(d);
            }
        }
        None
    }
}
