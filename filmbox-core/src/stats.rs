//! Per-decode quality metrics

use core::ops::AddAssign;
use serde::{Deserialize, Serialize};

/// Quality metrics of one decode call
///
/// Codecs that only validate report all zeros. Pipelines sum the counts and
/// accumulate the FEC signals of their stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Errors the codec corrected
    pub resolved_errors: usize,

    /// Errors the codec detected but could not correct
    pub unresolved_errors: usize,

    /// Amount of correction capacity spent
    pub fec_accumulated_amount: f32,

    /// Correction capacity available
    pub fec_accumulated_weight: f32,
}

impl DecodeStats {
    /// Whether nothing was corrected or left uncorrected
    pub fn is_clean(&self) -> bool {
        self.resolved_errors == 0 && self.unresolved_errors == 0
    }

    /// Share of correction capacity spent, 0.0 when none was available
    pub fn fec_load(&self) -> f32 {
        if self.fec_accumulated_weight <= 0.0 {
            0.0
        } else {
            self.fec_accumulated_amount / self.fec_accumulated_weight
        }
    }

    /// Fold another stage's metrics into this record
    pub fn merge(&mut self, other: &DecodeStats) {
        self.resolved_errors += other.resolved_errors;
        self.unresolved_errors += other.unresolved_errors;
        self.fec_accumulated_amount += other.fec_accumulated_amount;
        self.fec_accumulated_weight += other.fec_accumulated_weight;
    }
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_everything() {
        let mut total = DecodeStats::default();
        total += DecodeStats {
            resolved_errors: 2,
            unresolved_errors: 0,
            fec_accumulated_amount: 2.0,
            fec_accumulated_weight: 4.0,
        };
        total += DecodeStats {
            resolved_errors: 1,
            unresolved_errors: 3,
            fec_accumulated_amount: 1.0,
            fec_accumulated_weight: 4.0,
        };

        assert_eq!(total.resolved_errors, 3);
        assert_eq!(total.unresolved_errors, 3);
        assert_eq!(total.fec_load(), 3.0 / 8.0);
        assert!(!total.is_clean());
        assert!(DecodeStats::default().is_clean());
        assert_eq!(DecodeStats::default().fec_load(), 0.0);
    }
}
