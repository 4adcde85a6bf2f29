//! Core control chart types and the detection trait.
//!
//! Defines the building blocks shared by the Shewhart and EWMA charts:
//! control limits, violation records, and the [`OutOfControlDetector`]
//! trait implemented by every fitted chart.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.

use serde::Serialize;

/// Control limits for a chart.
///
/// Represents the upper control limit (UCL), center line (CL), and lower
/// control limit (LCL).
///
/// # Invariants
///
/// - `lcl <= cl <= ucl`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlLimits {
    /// Upper control limit.
    pub ucl: f64,
    /// Center line (process mean or target).
    pub cl: f64,
    /// Lower control limit.
    pub lcl: f64,
}

impl ControlLimits {
    /// Limits placed `half_width` above and below `center`.
    pub fn symmetric(center: f64, half_width: f64) -> Self {
        Self {
            ucl: center + half_width,
            cl: center,
            lcl: center - half_width,
        }
    }

    /// Distance from the center line to the upper limit.
    pub fn half_width(&self) -> f64 {
        self.ucl - self.cl
    }

    /// Whether `value` falls strictly above the UCL or below the LCL.
    pub fn is_violated_by(&self, value: f64) -> bool {
        value > self.ucl || value < self.lcl
    }
}

/// A point flagged as out of control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// 1-based position of the point in the monitored sequence.
    pub index: usize,
    /// The raw observation at this position.
    pub value: f64,
    /// Position relative to the EWMA stabilization index.
    ///
    /// Negative when the violation happens before the limits stabilize.
    /// `None` for charts without a warm-up regime.
    pub index_after_steady_state: Option<i64>,
    /// The smoothed statistic that crossed the limits, for EWMA charts.
    pub statistic: Option<f64>,
}

impl Violation {
    /// The run length this violation represents.
    ///
    /// EWMA violations count from the stabilization index, all others from
    /// the start of the sequence.
    pub fn run_length(&self) -> i64 {
        self.index_after_steady_state.unwrap_or(self.index as i64)
    }
}

/// A fitted chart that flags out-of-control points in a sequence.
///
/// Implementors hold immutable fitted limits; detection never mutates them,
/// so the same fitted chart can be applied to any number of sequences.
pub trait OutOfControlDetector {
    /// Limits against which points are flagged.
    fn limits(&self) -> ControlLimits;

    /// All violations in `data`, in order of position.
    fn predict(&self, data: &[f64]) -> Vec<Violation>;

    /// The first violation in `data`, or `None` if the sequence stays in control.
    fn first_violation(&self, data: &[f64]) -> Option<Violation> {
        self.predict(data).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_limits_symmetric() {
        let limits = ControlLimits::symmetric(25.0, 5.0);
        assert!((limits.ucl - 30.0).abs() < f64::EPSILON);
        assert!((limits.cl - 25.0).abs() < f64::EPSILON);
        assert!((limits.lcl - 20.0).abs() < f64::EPSILON);
        assert!((limits.half_width() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_violated_by_is_strict() {
        let limits = ControlLimits {
            ucl: 49.5,
            cl: 48.0,
            lcl: 46.5,
        };
        assert!(!limits.is_violated_by(49.5));
        assert!(!limits.is_violated_by(46.5));
        assert!(limits.is_violated_by(49.51));
        assert!(limits.is_violated_by(46.49));
        assert!(!limits.is_violated_by(f64::NAN));
    }

    #[test]
    fn test_run_length_prefers_steady_state_index() {
        let plain = Violation {
            index: 7,
            value: 1.0,
            index_after_steady_state: None,
            statistic: None,
        };
        assert_eq!(plain.run_length(), 7);

        let ewma = Violation {
            index: 7,
            value: 1.0,
            index_after_steady_state: Some(-12),
            statistic: Some(0.9),
        };
        assert_eq!(ewma.run_length(), -12);
    }

    #[test]
    fn test_control_limits_copy() {
        let limits = ControlLimits::symmetric(0.0, 1.0);
        let copied = limits;
        assert_eq!(limits, copied);
    }
}
