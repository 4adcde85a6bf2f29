//! Bias-correction constants for small-sample sigma estimation.
//!
//! The c4 constant corrects the downward bias of the sample standard
//! deviation for normal data: `E[s] = c4(n) * sigma`.
//!
//! # Reference
//!
//! ASTM E2587 — Standard Practice for Use of Control Charts in Statistical
//! Process Control, Table 1.

/// c4 factors indexed by sample size, `C4[n - 2]` for n = 2..=25.
const C4: [f64; 24] = [
    0.7979, 0.8862, 0.9213, 0.9400, 0.9515, 0.9594, 0.9650, 0.9693, 0.9727, 0.9754, 0.9776,
    0.9794, 0.9810, 0.9823, 0.9835, 0.9845, 0.9854, 0.9862, 0.9869, 0.9876, 0.9882, 0.9887,
    0.9892, 0.9896,
];

/// Largest sample size for which the bias correction is applied.
pub const MAX_CORRECTED_SAMPLE_SIZE: usize = 25;

/// Source of c4 bias-correction constants.
///
/// Implemented by [`C4Table`] and by any `Fn(usize) -> Option<f64>`, so a
/// caller can inject its own table (e.g. loaded from a file) or a stub in
/// tests.
pub trait BiasConstants {
    /// The c4 constant for sample size `n`, or `None` if the table lacks it.
    fn c4(&self, n: usize) -> Option<f64>;
}

/// Standard c4 table for sample sizes 2 through 25.
#[derive(Debug, Clone, Copy, Default)]
pub struct C4Table;

impl BiasConstants for C4Table {
    fn c4(&self, n: usize) -> Option<f64> {
        n.checked_sub(2).and_then(|row| C4.get(row)).copied()
    }
}

impl<F> BiasConstants for F
where
    F: Fn(usize) -> Option<f64>,
{
    fn c4(&self, n: usize) -> Option<f64> {
        self(n)
    }
}
