//! Monte-Carlo Average Run Length experiments.
//!
//! Drives repeated simulated runs through fitted charts to estimate their
//! empirical ARL under mean shifts.
//!
//! - [`run_shewhart`] — empirical ARL next to the closed-form geometric ARL
//! - [`run_ewma`] — empirical ARL over an (L, lambda) grid built by [`ewma_grid`]
//! - [`ExperimentConfig`] — JSON-loadable settings with reference defaults
//! - [`report`] — text and JSON rendering of result rows

mod arl;
mod config;
pub mod report;

pub use arl::{
    ewma_grid, run_ewma, run_shewhart, EwmaArlRow, EwmaExperiment, EwmaParams, RunLengthSummary,
    ShewhartArlRow, ShewhartExperiment, Simulation,
};
pub use config::ExperimentConfig;
