use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::chart::chart_model::ChartPoint;

/// Structural fingerprint of a normalized series.
pub fn fingerprint(series: &[ChartPoint]) -> u64 {
    let mut hasher = DefaultHasher::new();
    series.len().hash(&mut hasher);
    for point in series {
        point.date.hash(&mut hasher);
        // +0.0 folds -0.0 into 0.0 so both hash alike
        (point.income + 0.0).to_bits().hash(&mut hasher);
        (point.expense + 0.0).to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Suppresses render calls for a series identical to the last accepted one.
#[derive(Debug, Default)]
pub struct ChangeGate {
    accepted: Option<u64>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the series differs from the last accepted one and
    /// records it as accepted.
    pub fn admit(&mut self, series: &[ChartPoint]) -> bool {
        let current = fingerprint(series);
        if self.accepted == Some(current) {
            return false;
        }
        self.accepted = Some(current);
        true
    }

    /// Forget the accepted series so the next one always passes.
    pub fn reset(&mut self) {
        self.accepted = None;
    }
}
