//! # spc-arl
//!
//! Shewhart and EWMA control charts for a univariate, normally distributed
//! quality characteristic, and a Monte-Carlo harness estimating their
//! Average Run Length (ARL) under mean shifts.
//!
//! ## Modules
//!
//! - [`spc`] — Control charts: limit fitting and out-of-control detection
//! - [`experiment`] — Monte-Carlo ARL experiments, configuration, and result tables
//! - [`error`] — Error kinds shared by fitting and experiments
//!
//! ## Design Philosophy
//!
//! - **Fit once, predict many**: fitting returns an immutable chart value
//!   that owns its limits
//! - **Injectable constants**: small-sample bias correction goes through
//!   [`spc::BiasConstants`], so no file I/O is needed
//! - **Reproducible simulation**: every trial is seeded independently, so
//!   sequential and parallel runs agree
//!
//! ## Example
//!
//! ```
//! use spc_arl::spc::{OutOfControlDetector, ShewhartChart};
//!
//! let fitted = ShewhartChart::new(3.0)?.fit_known(48.0, 0.5)?;
//! let moments = fitted.run_length_moments(48.0, 0.5)?;
//! assert!((moments.arl - 370.4).abs() < 0.5);
//! # Ok::<(), spc_arl::SpcError>(())
//! ```

pub mod error;
pub mod experiment;
pub mod spc;

pub use error::{Result, SpcError};
