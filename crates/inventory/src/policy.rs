use serde::{Deserialize, Serialize};

/// Per-call reconciliation settings.
///
/// Passed explicitly into every reconciliation; there is no process-wide default
/// hidden behind a global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// Create records for labels with no inventory match (catalog-derived or synthesized).
    pub allow_unknown: bool,
    /// Minimum quantity given to new records when the catalog does not provide one.
    pub default_min_quantity: u32,
    /// Detector confidence floor.
    pub min_score: f32,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            allow_unknown: true,
            default_min_quantity: 1,
            min_score: 0.5,
        }
    }
}

impl ReconcilePolicy {
    pub fn with_allow_unknown(mut self, allow_unknown: bool) -> Self {
        self.allow_unknown = allow_unknown;
        self
    }

    pub fn with_default_min_quantity(mut self, default_min_quantity: u32) -> Self {
        self.default_min_quantity = default_min_quantity;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}
