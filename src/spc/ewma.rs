//! Exponentially Weighted Moving Average (EWMA) control chart.
//!
//! # Algorithm
//!
//! The EWMA statistic is seeded at the center line and then smoothed
//! recursively:
//!
//! ```text
//! Z_0 = mu_0
//! Z_i = lambda * x_i + (1 - lambda) * Z_{i-1},   i >= 1
//! ```
//!
//! Time-varying (non-steady-state) control limits:
//!
//! ```text
//! UCL_i = mu_0 + L * sigma * sqrt(lambda / (2 - lambda) * (1 - (1 - lambda)^(2*i)))
//! LCL_i = mu_0 - L * sigma * sqrt(lambda / (2 - lambda) * (1 - (1 - lambda)^(2*i)))
//! ```
//!
//! Steady-state limits (as i -> infinity):
//!
//! ```text
//! UCL = mu_0 + L * sigma * sqrt(lambda / (2 - lambda))
//! LCL = mu_0 - L * sigma * sqrt(lambda / (2 - lambda))
//! ```
//!
//! The stabilization index is the position past which the two sets of
//! limits agree to within `1e-5` in the decay term:
//!
//! ```text
//! i* = round(ln(1e-5) / (2 * ln(1 - lambda)))
//! ```
//!
//! Violations are flagged against the **steady-state** limits at every
//! position, including positions before `i*`. Each violation records its
//! position relative to `i*`, which is negative for early signals.
//!
//! Non-finite observations are skipped: the statistic carries its previous
//! value forward over them and they never signal.
//!
//! # Parameters
//!
//! - **lambda**: smoothing constant in (0, 1). Smaller values give more weight
//!   to historical data and are better at detecting small shifts.
//! - **L**: control limit width factor in multiples of sigma. Typical: 2.7-3.1.
//!
//! # Reference
//!
//! Roberts, S.W. (1959). "Control Chart Tests Based on Geometric Moving Averages",
//! *Technometrics* 1(3), pp. 239-250.

use super::chart::{ControlLimits, OutOfControlDetector, Violation};
use crate::error::{require_finite, require_positive, Result, SpcError};

/// Decay tolerance defining when the non-steady-state limits have stabilized.
pub const STABILIZATION_EPSILON: f64 = 1e-5;

/// EWMA chart tuning parameters.
///
/// # Examples
///
/// ```
/// use spc_arl::spc::{EwmaChart, OutOfControlDetector};
///
/// let chart = EwmaChart::new(3.0, 0.25).expect("valid params");
/// let fitted = chart.fit(100, 48.0, 0.5).expect("valid fit");
///
/// let steady = fitted.limits();
/// let first = fitted.limits_at(1).expect("within sample size");
/// assert!(first.ucl < steady.ucl);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EwmaChart {
    /// Control limit width factor (L).
    l_factor: f64,
    /// Smoothing constant (0 < lambda <= 1).
    lambda: f64,
}

/// EWMA chart with fitted steady-state and non-steady-state limits.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedEwma {
    l_factor: f64,
    lambda: f64,
    sigma: f64,
    steady_state: ControlLimits,
    /// Limits at positions 1..=sample_size.
    non_steady_state: Vec<ControlLimits>,
    stabilization_index: i64,
}

impl EwmaChart {
    /// Creates an EWMA chart with width factor `l_factor` and weight `lambda`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `l_factor` is not positive and finite or
    /// `lambda` is outside (0, 1].
    pub fn new(l_factor: f64, lambda: f64) -> Result<Self> {
        let l_factor = require_positive("l_factor", l_factor)?;
        if !lambda.is_finite() || lambda <= 0.0 || lambda > 1.0 {
            return Err(SpcError::invalid_parameter(
                "lambda",
                format!("must be in (0, 1], got {lambda}"),
            ));
        }
        Ok(Self { l_factor, lambda })
    }

    /// The control limit width factor.
    pub fn l_factor(&self) -> f64 {
        self.l_factor
    }

    /// The smoothing constant.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Fits limits for sequences of `sample_size` observations drawn around
    /// a known `mean` with standard deviation `sigma`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `sample_size` is zero, `mean` is not finite,
    /// `sigma` is not positive and finite, or `lambda == 1` (the
    /// stabilization index is undefined).
    pub fn fit(&self, sample_size: usize, mean: f64, sigma: f64) -> Result<FittedEwma> {
        if sample_size < 1 {
            return Err(SpcError::invalid_parameter(
                "sample_size",
                "must be at least 1",
            ));
        }
        let mean = require_finite("mean", mean)?;
        let sigma = require_positive("sigma", sigma)?;
        let stabilization_index = stabilization_index(self.lambda)?;

        let steady_state = ControlLimits::symmetric(mean, self.half_width(sigma, None));
        let non_steady_state = (1..=sample_size)
            .map(|i| ControlLimits::symmetric(mean, self.half_width(sigma, Some(i))))
            .collect();

        Ok(FittedEwma {
            l_factor: self.l_factor,
            lambda: self.lambda,
            sigma,
            steady_state,
            non_steady_state,
            stabilization_index,
        })
    }

    /// Limit half-width at 1-based position `i`, or the asymptote for `None`.
    fn half_width(&self, sigma: f64, i: Option<usize>) -> f64 {
        let asymptotic_var = self.lambda / (2.0 - self.lambda);
        let var = match i {
            Some(i) => {
                let decay = (1.0 - self.lambda).powf(2.0 * i as f64);
                asymptotic_var * (1.0 - decay)
            }
            None => asymptotic_var,
        };
        self.l_factor * sigma * var.sqrt()
    }
}

/// Position past which the EWMA limits are numerically at steady state.
///
/// # Errors
///
/// `InvalidParameter` if `lambda` is outside (0, 1). At `lambda == 1` the
/// logarithm of `1 - lambda` is undefined.
///
/// For very small `lambda` the index saturates at `i64::MAX`.
pub fn stabilization_index(lambda: f64) -> Result<i64> {
    if !lambda.is_finite() || lambda <= 0.0 || lambda >= 1.0 {
        return Err(SpcError::invalid_parameter(
            "lambda",
            format!("stabilization index needs lambda in (0, 1), got {lambda}"),
        ));
    }
    // ln_1p keeps the denominator nonzero when 1 - lambda rounds to 1.
    let index = STABILIZATION_EPSILON.ln() / (2.0 * (-lambda).ln_1p());
    Ok(index.round() as i64)
}

impl FittedEwma {
    /// The control limit width factor.
    pub fn l_factor(&self) -> f64 {
        self.l_factor
    }

    /// The smoothing constant.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// The process standard deviation the limits were built from.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Asymptotic limits.
    pub fn steady_state_limits(&self) -> ControlLimits {
        self.steady_state
    }

    /// Time-varying limits for positions `1..=sample_size`.
    pub fn non_steady_state_limits(&self) -> &[ControlLimits] {
        &self.non_steady_state
    }

    /// Time-varying limits at 1-based position `i`.
    ///
    /// Returns `None` for position 0 or past the fitted sample size.
    pub fn limits_at(&self, i: usize) -> Option<ControlLimits> {
        i.checked_sub(1)
            .and_then(|idx| self.non_steady_state.get(idx))
            .copied()
    }

    /// Number of positions the non-steady-state limits were fitted for.
    pub fn sample_size(&self) -> usize {
        self.non_steady_state.len()
    }

    /// Position past which the limits are at steady state.
    pub fn stabilization_index(&self) -> i64 {
        self.stabilization_index
    }

    /// The EWMA statistic for every position of `data`.
    ///
    /// `Z_0` is the center line; the first observation only occupies the
    /// seed position. A non-finite observation repeats the previous value.
    ///
    /// # Complexity
    ///
    /// Time: O(n), Space: O(n)
    pub fn statistic(&self, data: &[f64]) -> Vec<f64> {
        let mut z = Vec::with_capacity(data.len());
        if data.is_empty() {
            return z;
        }
        let mut prev = self.steady_state.cl;
        z.push(prev);
        for &x in &data[1..] {
            prev = self.smooth(prev, x);
            z.push(prev);
        }
        z
    }

    fn smooth(&self, prev: f64, x: f64) -> f64 {
        if x.is_finite() {
            self.lambda * x + (1.0 - self.lambda) * prev
        } else {
            prev
        }
    }

    fn violation(&self, i: usize, x: f64, z: f64) -> Violation {
        let index = i + 1;
        Violation {
            index,
            value: x,
            index_after_steady_state: Some(
                i64::try_from(index)
                    .unwrap_or(i64::MAX)
                    .saturating_sub(self.stabilization_index),
            ),
            statistic: Some(z),
        }
    }
}

impl OutOfControlDetector for FittedEwma {
    fn limits(&self) -> ControlLimits {
        self.steady_state
    }

    fn predict(&self, data: &[f64]) -> Vec<Violation> {
        self.statistic(data)
            .into_iter()
            .zip(data)
            .enumerate()
            .filter(|&(_, (z, x))| x.is_finite() && self.steady_state.is_violated_by(z))
            .map(|(i, (z, &x))| self.violation(i, x, z))
            .collect()
    }

    fn first_violation(&self, data: &[f64]) -> Option<Violation> {
        let first = data.first()?;
        let mut z = self.steady_state.cl;
        if self.steady_state.is_violated_by(z) {
            return Some(self.violation(0, *first, z));
        }
        for (i, &x) in data.iter().enumerate().skip(1) {
            z = self.smooth(z, x);
            if x.is_finite() && self.steady_state.is_violated_by(z) {
                return Some(self.violation(i, x, z));
            }
        }
        None
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn non_steady_width_below_steady_and_increasing(
            lambda in 0.02_f64..0.5,
            l in 0.5_f64..4.0,
            sigma in 0.01_f64..10.0,
        ) {
            let chart = EwmaChart::new(l, lambda).expect("valid");
            let n = stabilization_index(lambda).expect("lambda < 1") as usize + 5;
            let fitted = chart.fit(n, 0.0, sigma).expect("valid");
            let steady = fitted.steady_state_limits().half_width();
            prop_assert!((steady - l * sigma * (lambda / (2.0 - lambda)).sqrt()).abs() < 1e-12 * (1.0 + steady));

            let widths: Vec<f64> = fitted
                .non_steady_state_limits()
                .iter()
                .map(ControlLimits::half_width)
                .collect();
            for w in &widths {
                prop_assert!(*w < steady, "width {} not below steady {}", w, steady);
            }
            for pair in widths.windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
            let at_index = fitted
                .limits_at(fitted.stabilization_index().max(1) as usize)
                .expect("fitted past the index")
                .half_width();
            prop_assert!(steady - at_index < 1e-4 * steady);
        }

        #[test]
        fn constant_center_stream_never_signals(
            lambda in 0.01_f64..0.99,
            center in -1e3_f64..1e3,
            n in 1_usize..100,
        ) {
            let fitted = EwmaChart::new(3.0, lambda)
                .and_then(|c| c.fit(n, center, 1.0))
                .expect("valid");
            let data = vec![center; n];
            for z in fitted.statistic(&data) {
                prop_assert!((z - center).abs() < 1e-9 * (1.0 + center.abs()));
            }
            prop_assert!(fitted.predict(&data).is_empty());
        }
    }
}
