//! Shewhart control chart for individual observations.
//!
//! # Algorithm
//!
//! Limits sit `k` standard deviations either side of the process mean:
//!
//! ```text
//! UCL = mu + k * sigma
//! CL  = mu
//! LCL = mu - k * sigma
//! ```
//!
//! When mean or sigma are unknown they are estimated from a reference
//! sample. Sigma is the standard error of the sample mean, bias-corrected
//! with c4 for samples of 25 or fewer:
//!
//! ```text
//! sigma = s * c4(n) / sqrt(n)    (n <= 25)
//! sigma = s / sqrt(n)            (n >  25)
//! ```
//!
//! Under fixed limits and i.i.d. sampling the run length is geometric with
//! success probability equal to the power of a single-point test, giving
//! `ARL = 1 / power` and `SD = sqrt((1 - power) / power^2)`. For very wide
//! limits the normal tail underflows, power becomes 0 and both moments are
//! infinite; they serialize as the string `"inf"`.
//!
//! # Reference
//!
//! Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.,
//! Chapter 6.

use serde::{Serialize, Serializer};
use u_optim::special::standard_normal_cdf;

use super::chart::{ControlLimits, OutOfControlDetector, Violation};
use super::constants::{BiasConstants, MAX_CORRECTED_SAMPLE_SIZE};
use crate::error::{require_finite, require_positive, Result, SpcError};

/// Shewhart chart tuning parameters.
///
/// # Examples
///
/// ```
/// use spc_arl::spc::{OutOfControlDetector, ShewhartChart};
///
/// let chart = ShewhartChart::new(3.0).expect("valid k");
/// let fitted = chart.fit_known(48.0, 0.5).expect("valid params");
/// assert!((fitted.limits().ucl - 49.5).abs() < 1e-12);
///
/// let violations = fitted.predict(&[48.0, 50.0, 47.0, 44.0]);
/// assert_eq!(violations.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShewhartChart {
    /// Width of the control band in standard deviations.
    k: f64,
}

/// Shewhart chart with fitted limits.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedShewhart {
    k: f64,
    sigma: f64,
    limits: ControlLimits,
}

/// Geometric run-length moments of a Shewhart chart under a given mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunLengthMoments {
    /// Probability that a single observation falls outside the limits.
    pub power: f64,
    /// Average run length, `1 / power`. Infinite when `power` is 0.
    #[serde(serialize_with = "serialize_unbounded")]
    pub arl: f64,
    /// Run-length standard deviation, `sqrt((1 - power) / power^2)`.
    #[serde(serialize_with = "serialize_unbounded")]
    pub stdev: f64,
}

/// Writes an infinite moment as `"inf"` so it stays distinct from `null`.
pub(crate) fn serialize_unbounded<S>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_infinite() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*value)
    }
}

impl ShewhartChart {
    /// Creates a chart whose limits lie `k` standard deviations from the mean.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `k` is not positive and finite.
    pub fn new(k: f64) -> Result<Self> {
        let k = require_positive("k", k)?;
        Ok(Self { k })
    }

    /// The band width multiplier.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Fits limits from a known process mean and standard deviation.
    pub fn fit_known(&self, mean: f64, sigma: f64) -> Result<FittedShewhart> {
        let mean = require_finite("mean", mean)?;
        let sigma = require_positive("sigma", sigma)?;
        Ok(self.fitted(mean, sigma))
    }

    /// Fits limits, estimating whichever of `mean` and `sigma` is `None`
    /// from `data`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if a parameter must be estimated and `data` is empty,
    ///   contains non-finite values, or (for sigma) has fewer than 2 points.
    /// - `LookupFailure` if sigma is estimated from `n <= 25` points and
    ///   `constants` has no c4 for `n`.
    /// - `InvalidParameter` if a supplied mean or sigma is out of range.
    pub fn fit(
        &self,
        data: &[f64],
        mean: Option<f64>,
        sigma: Option<f64>,
        constants: &impl BiasConstants,
    ) -> Result<FittedShewhart> {
        let mean = match mean {
            Some(m) => require_finite("mean", m)?,
            None => u_optim::stats::mean(checked_sample(data)?).ok_or_else(|| {
                SpcError::InvalidInput("cannot estimate mean from data".to_string())
            })?,
        };
        let sigma = match sigma {
            Some(s) => require_positive("sigma", s)?,
            None => estimate_sigma(checked_sample(data)?, constants)?,
        };
        Ok(self.fitted(mean, sigma))
    }

    fn fitted(&self, mean: f64, sigma: f64) -> FittedShewhart {
        FittedShewhart {
            k: self.k,
            sigma,
            limits: ControlLimits::symmetric(mean, self.k * sigma),
        }
    }
}

impl FittedShewhart {
    /// The band width multiplier the chart was fitted with.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// The standard deviation the limits were built from.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Run-length moments when observations are `N(shifted_mean, sigma)`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `shifted_mean` is not finite or `sigma` is not
    /// positive and finite.
    pub fn run_length_moments(&self, shifted_mean: f64, sigma: f64) -> Result<RunLengthMoments> {
        let mu = require_finite("shifted_mean", shifted_mean)?;
        let sigma = require_positive("sigma", sigma)?;
        let upper = standard_normal_cdf((self.limits.ucl - mu) / sigma);
        let lower = standard_normal_cdf((self.limits.lcl - mu) / sigma);
        let power = 1.0 - (upper - lower);
        Ok(RunLengthMoments {
            power,
            arl: 1.0 / power,
            stdev: ((1.0 - power) / (power * power)).sqrt(),
        })
    }
}

impl OutOfControlDetector for FittedShewhart {
    fn limits(&self) -> ControlLimits {
        self.limits
    }

    fn predict(&self, data: &[f64]) -> Vec<Violation> {
        data.iter()
            .enumerate()
            .filter(|&(_, &x)| self.limits.is_violated_by(x))
            .map(|(i, &x)| Violation {
                index: i + 1,
                value: x,
                index_after_steady_state: None,
                statistic: None,
            })
            .collect()
    }

    fn first_violation(&self, data: &[f64]) -> Option<Violation> {
        data.iter()
            .position(|&x| self.limits.is_violated_by(x))
            .map(|i| Violation {
                index: i + 1,
                value: data[i],
                index_after_steady_state: None,
                statistic: None,
            })
    }
}

fn checked_sample(data: &[f64]) -> Result<&[f64]> {
    if data.is_empty() {
        return Err(SpcError::InvalidInput(
            "data is empty and mean/sigma were not supplied".to_string(),
        ));
    }
    if !data.iter().all(|x| x.is_finite()) {
        return Err(SpcError::InvalidInput(
            "data contains non-finite values".to_string(),
        ));
    }
    Ok(data)
}

/// Standard error of the mean, c4-corrected for small samples.
fn estimate_sigma(data: &[f64], constants: &impl BiasConstants) -> Result<f64> {
    let n = data.len();
    let s = u_optim::stats::std_dev(data).ok_or_else(|| {
        SpcError::InvalidInput(format!(
            "need at least 2 observations to estimate sigma, got {n}"
        ))
    })?;
    let root_n = (n as f64).sqrt();
    if n <= MAX_CORRECTED_SAMPLE_SIZE {
        let c4 = constants
            .c4(n)
            .ok_or(SpcError::LookupFailure { sample_size: n })?;
        Ok(s * c4 / root_n)
    } else {
        Ok(s / root_n)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn limits_are_k_sigma_from_mean(
            k in 0.1_f64..6.0,
            mean in -1e3_f64..1e3,
            sigma in 1e-3_f64..1e2,
        ) {
            let fitted = ShewhartChart::new(k)
                .and_then(|c| c.fit_known(mean, sigma))
                .expect("valid");
            let l = fitted.limits();
            let tol = 1e-9 * (1.0 + mean.abs() + k * sigma);
            prop_assert!(((l.ucl - mean) - k * sigma).abs() < tol);
            prop_assert!(((mean - l.lcl) - k * sigma).abs() < tol);
            prop_assert!(l.ucl >= l.cl && l.cl >= l.lcl);
        }

        #[test]
        fn predict_flags_only_points_outside(
            data in proptest::collection::vec(-10.0_f64..10.0, 0..=60)
        ) {
            let fitted = ShewhartChart::new(2.0)
                .and_then(|c| c.fit_known(0.0, 2.0))
                .expect("valid");
            let violations = fitted.predict(&data);
            for v in &violations {
                prop_assert!(v.value > 4.0 || v.value < -4.0);
                prop_assert!((data[v.index - 1] - v.value).abs() < f64::EPSILON);
            }
            let expected = data.iter().filter(|x| x.abs() > 4.0).count();
            prop_assert_eq!(violations.len(), expected);
        }
    }
}
