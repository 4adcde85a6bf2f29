//! Statistical Process Control (SPC) charts for individual observations.
//!
//! Every chart follows the same lifecycle: a chart value holds tuning
//! parameters, `fit` turns it into an immutable fitted chart owning its
//! limits, and the fitted chart implements [`OutOfControlDetector`].
//!
//! # Charts
//!
//! - [`ShewhartChart`] — fixed `mean ± k·sigma` limits, known or estimated parameters
//! - [`EwmaChart`] — EWMA statistic with steady-state and non-steady-state limits
//!
//! # Bias Correction
//!
//! - [`BiasConstants`] — injectable c4 lookup, with [`C4Table`] as the standard table
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - Roberts, S.W. (1959). "Control Chart Tests Based on Geometric Moving Averages",
//!   *Technometrics* 1(3), pp. 239-250.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

mod chart;
mod constants;
mod ewma;
mod shewhart;

pub use chart::{ControlLimits, OutOfControlDetector, Violation};
pub use constants::{BiasConstants, C4Table, MAX_CORRECTED_SAMPLE_SIZE};
pub use ewma::{stabilization_index, EwmaChart, FittedEwma, STABILIZATION_EPSILON};
pub use shewhart::{FittedShewhart, RunLengthMoments, ShewhartChart};
pub(crate) use shewhart::serialize_unbounded;
