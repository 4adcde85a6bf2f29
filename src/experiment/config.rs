//! Experiment configuration.
//!
//! Defaults reproduce the reference study: a process at mean 48 with
//! sigma 0.5, shifts from 0 to 2 sigma, 500 trials of 10,000 observations,
//! a 3-sigma Shewhart chart, and the EWMA grid built from
//! `L = [3.054, 2.998, 3.0]` and `lambda = [0.40, 0.25, 0.10, 0.05]`.

use serde::{Deserialize, Serialize};

use super::arl::{ewma_grid, EwmaExperiment, ShewhartExperiment, Simulation};
use crate::error::Result;

/// Settings for both ARL experiments, deserializable from JSON.
///
/// Missing fields take their defaults.
///
/// # Examples
///
/// ```
/// use spc_arl::experiment::ExperimentConfig;
///
/// let config = ExperimentConfig::from_json(r#"{ "trials": 50, "k": 2.5 }"#)
///     .expect("valid json");
/// assert_eq!(config.trials, 50);
/// assert_eq!(config.sample_size, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Mean shifts in multiples of sigma.
    pub deltas: Vec<f64>,
    /// In-control process mean.
    pub mean: f64,
    /// Process standard deviation.
    pub sigma: f64,
    /// Observations per trial.
    pub sample_size: usize,
    /// Trials per parameter combination.
    pub trials: usize,
    /// Base seed for the random draws.
    pub seed: u64,
    /// Shewhart band width in standard deviations.
    pub k: f64,
    /// EWMA width factors.
    pub l_values: Vec<f64>,
    /// EWMA smoothing constants; see [`ewma_grid`] for the pairing.
    pub lambda_values: Vec<f64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            deltas: vec![0.0, 0.25, 0.50, 0.75, 1.0, 1.50, 2.0],
            mean: 48.0,
            sigma: 0.50,
            sample_size: 10_000,
            trials: 500,
            seed: 7,
            k: 3.0,
            l_values: vec![3.054, 2.998, 3.0],
            lambda_values: vec![0.40, 0.25, 0.10, 0.05],
        }
    }
}

impl ExperimentConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Validated simulation settings.
    pub fn simulation(&self) -> Result<Simulation> {
        Simulation::new(
            self.deltas.clone(),
            self.mean,
            self.sigma,
            self.sample_size,
            self.trials,
            self.seed,
        )
    }

    /// The Shewhart experiment described by this configuration.
    pub fn shewhart(&self) -> Result<ShewhartExperiment> {
        Ok(ShewhartExperiment {
            simulation: self.simulation()?,
            k: self.k,
        })
    }

    /// The EWMA experiment described by this configuration.
    pub fn ewma(&self) -> Result<EwmaExperiment> {
        Ok(EwmaExperiment {
            simulation: self.simulation()?,
            grid: ewma_grid(&self.l_values, &self.lambda_values)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpcError;

    #[test]
    fn test_default_matches_reference_study() {
        let config = ExperimentConfig::default();
        assert_eq!(config.deltas.len(), 7);
        assert_eq!(config.trials, 500);
        assert_eq!(config.sample_size, 10_000);
        assert_eq!(config.seed, 7);
        let ewma = config.ewma().expect("valid default");
        assert_eq!(ewma.grid.len(), 6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExperimentConfig::from_json(r#"{ "deltas": [0.0, 1.0], "seed": 42 }"#)
            .expect("valid json");
        assert_eq!(config.deltas, vec![0.0, 1.0]);
        assert_eq!(config.seed, 42);
        assert!((config.mean - 48.0).abs() < f64::EPSILON);
        assert_eq!(config.l_values, vec![3.054, 2.998, 3.0]);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(ExperimentConfig::from_json(r#"{ "trials": "many" }"#).is_err());
    }

    #[test]
    fn test_invalid_settings_surface_errors() {
        let config = ExperimentConfig {
            sample_size: 0,
            ..ExperimentConfig::default()
        };
        assert!(matches!(
            config.shewhart(),
            Err(SpcError::InvalidParameter { name: "sample_size", .. })
        ));

        let config = ExperimentConfig {
            lambda_values: vec![0.4],
            ..ExperimentConfig::default()
        };
        assert!(matches!(config.ewma(), Err(SpcError::InvalidInput(_))));
    }
}
