//! Per-(pair, band) experiment records.

use serde::{Deserialize, Serialize};

/// Outcome of the full real-vs-null comparison for one pair and one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Pair label, e.g. `NIST-PTB`.
    pub pair: String,
    /// Band label, e.g. `target_8_12d`.
    pub band: String,
    /// Walk-forward skill of the real phasor sequence.
    pub real_skill: f64,
    /// Mean of the null distribution.
    pub null_mean: f64,
    /// 95th percentile of the null distribution.
    pub null_95: f64,
    /// One-sided Monte-Carlo p-value.
    pub p_value: f64,
    /// Number of surrogate draws.
    pub surrogates: usize,
}

impl ResultRow {
    /// Returns true if the p-value falls below `alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// Returns true if the real skill exceeds the null 95th percentile.
    #[must_use]
    pub fn exceeds_null_95(&self) -> bool {
        self.real_skill > self.null_95
    }
}

/// Slot in the ordered experiment output: either a completed row or a visible failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    /// Analysis finished and produced a row.
    Completed(ResultRow),
    /// Analysis failed for this combination.
    Failed {
        /// Pair label.
        pair: String,
        /// Band label.
        band: String,
        /// Human-readable error.
        error: String,
    },
}

impl RowOutcome {
    /// Pair label of this slot.
    #[must_use]
    pub fn pair(&self) -> &str {
        match self {
            Self::Completed(row) => &row.pair,
            Self::Failed { pair, .. } => pair,
        }
    }

    /// Band label of this slot.
    #[must_use]
    pub fn band(&self) -> &str {
        match self {
            Self::Completed(row) => &row.band,
            Self::Failed { band, .. } => band,
        }
    }

    /// The completed row, if any.
    #[must_use]
    pub fn row(&self) -> Option<&ResultRow> {
        match self {
            Self::Completed(row) => Some(row),
            Self::Failed { .. } => None,
        }
    }

    /// The error message, if this slot failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(p_value: f64) -> ResultRow {
        ResultRow {
            pair: "NIST-PTB".to_string(),
            band: "target_8_12d".to_string(),
            real_skill: 0.42,
            null_mean: 0.05,
            null_95: 0.2,
            p_value,
            surrogates: 2000,
        }
    }

    #[test]
    fn significance_uses_strict_threshold() {
        assert!(sample_row(0.01).is_significant(0.05));
        assert!(!sample_row(0.05).is_significant(0.05));
    }

    #[test]
    fn exceeds_null_95_compares_real_skill() {
        assert!(sample_row(0.01).exceeds_null_95());
    }

    #[test]
    fn outcome_accessors_cover_both_variants() {
        let done = RowOutcome::Completed(sample_row(0.1));
        assert_eq!(done.pair(), "NIST-PTB");
        assert!(done.row().is_some());
        assert!(done.error().is_none());

        let failed = RowOutcome::Failed {
            pair: "PTB-VSL".to_string(),
            band: "ctrl_low".to_string(),
            error: "insufficient overlap".to_string(),
        };
        assert_eq!(failed.band(), "ctrl_low");
        assert!(failed.row().is_none());
        assert_eq!(failed.error(), Some("insufficient overlap"));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failed = RowOutcome::Failed {
            pair: "A-B".to_string(),
            band: "x".to_string(),
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");

        let done = serde_json::to_value(RowOutcome::Completed(sample_row(0.5))).unwrap();
        assert_eq!(done["status"], "completed");
        assert_eq!(done["surrogates"], 2000);
    }
}
