//! Monte-Carlo Average Run Length (ARL) estimation.
//!
//! # Algorithm
//!
//! For each mean shift `delta` (in multiples of sigma):
//!
//! 1. Draw `trials` independent sequences of `sample_size` observations
//!    from `N(mean + delta * sigma, sigma)`.
//! 2. Apply the fitted chart to each sequence and take the run length of
//!    its first violation.
//! 3. Average the run lengths of the trials that signalled.
//!
//! Trials that never signal within `sample_size` observations are
//! right-censored: they are excluded from the average and only counted.
//! This biases the empirical ARL downward when many trials are censored,
//! most visibly for small shifts.
//!
//! Every trial draws from its own generator seeded from
//! `(seed, combination, trial)`, so results do not depend on the order in
//! which trials are evaluated.
//!
//! # Reference
//!
//! Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.,
//! Sections 6.2 and 9.2 (ARL of Shewhart and EWMA charts).

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{require_finite, require_positive, Result, SpcError};
use crate::spc::{serialize_unbounded, EwmaChart, OutOfControlDetector, ShewhartChart};

/// Process and sampling settings shared by every experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    deltas: Vec<f64>,
    mean: f64,
    sigma: f64,
    sample_size: usize,
    trials: usize,
    seed: u64,
}

/// One (L, lambda) pair of the EWMA parameter grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EwmaParams {
    /// Control limit width factor.
    pub l_factor: f64,
    /// Smoothing constant.
    pub lambda: f64,
}

/// Shewhart ARL experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShewhartExperiment {
    pub simulation: Simulation,
    /// Band width in standard deviations.
    pub k: f64,
}

/// EWMA ARL experiment over a parameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct EwmaExperiment {
    pub simulation: Simulation,
    /// Parameter pairs, evaluated in order.
    pub grid: Vec<EwmaParams>,
}

/// Outcome of the trials for one parameter combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLengthSummary {
    /// Mean run length of the trials that signalled, `None` if none did.
    pub empirical_arl: Option<f64>,
    /// Trials that signalled.
    pub signalled: usize,
    /// Trials excluded because they never signalled.
    pub censored: usize,
}

/// Result row of a Shewhart experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShewhartArlRow {
    /// Mean shift in multiples of sigma.
    pub delta: f64,
    /// Mean run length of signalling trials, `None` if all were censored.
    pub empirical_arl: Option<f64>,
    /// Geometric ARL, `1 / power`; `"inf"` in JSON when power underflows.
    #[serde(serialize_with = "serialize_unbounded")]
    pub theoretical_arl: f64,
    /// Geometric run-length standard deviation.
    #[serde(serialize_with = "serialize_unbounded")]
    pub theoretical_rl_stdev: f64,
    /// Trials excluded because they never signalled.
    pub censored_trials: usize,
}

/// Result row of an EWMA experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EwmaArlRow {
    /// Mean shift in multiples of sigma.
    pub delta: f64,
    /// Control limit width factor.
    pub l_factor: f64,
    /// Smoothing constant.
    pub lambda: f64,
    /// Mean run length after the stabilization index, `None` if all were censored.
    pub empirical_arl: Option<f64>,
    /// Trials excluded because they never signalled.
    pub censored_trials: usize,
}

impl Simulation {
    /// Validates and bundles the simulation settings.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `deltas` is empty or contains non-finite values.
    /// - `InvalidParameter` if `mean` is not finite, `sigma` is not positive,
    ///   or `sample_size`/`trials` is zero.
    pub fn new(
        deltas: Vec<f64>,
        mean: f64,
        sigma: f64,
        sample_size: usize,
        trials: usize,
        seed: u64,
    ) -> Result<Self> {
        if deltas.is_empty() {
            return Err(SpcError::InvalidInput("no shifts to evaluate".to_string()));
        }
        if let Some(d) = deltas.iter().find(|d| !d.is_finite()) {
            return Err(SpcError::InvalidInput(format!("shift {d} is not finite")));
        }
        let mean = require_finite("mean", mean)?;
        let sigma = require_positive("sigma", sigma)?;
        if sample_size < 1 {
            return Err(SpcError::invalid_parameter("sample_size", "must be at least 1"));
        }
        if trials < 1 {
            return Err(SpcError::invalid_parameter("trials", "must be at least 1"));
        }
        Ok(Self {
            deltas,
            mean,
            sigma,
            sample_size,
            trials,
            seed,
        })
    }

    /// Mean shifts in multiples of sigma.
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    /// In-control process mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Process standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Observations per trial.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Trials per parameter combination.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Base seed mixed into every trial's generator.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn shifted_mean(&self, delta: f64) -> f64 {
        self.mean + delta * self.sigma
    }

    /// Runs all trials of one combination against `detector`.
    fn run_trials<D>(&self, detector: &D, delta: f64, combination: u64) -> Result<RunLengthSummary>
    where
        D: OutOfControlDetector + Sync,
    {
        let normal = Normal::new(self.shifted_mean(delta), self.sigma)
            .map_err(|e| SpcError::invalid_parameter("sigma", e.to_string()))?;
        let trial = |t: usize| {
            run_trial(
                detector,
                &normal,
                self.sample_size,
                trial_seed(self.seed, combination, t as u64),
            )
        };

        #[cfg(feature = "parallel")]
        let run_lengths: Vec<Option<i64>> = (0..self.trials).into_par_iter().map(trial).collect();
        #[cfg(not(feature = "parallel"))]
        let run_lengths: Vec<Option<i64>> = (0..self.trials).map(trial).collect();

        Ok(summarize(&run_lengths))
    }
}

/// Builds the EWMA grid: the L at position `j` pairs with
/// `lambda_values[j]` and `lambda_values[j + 1]`.
///
/// # Errors
///
/// `InvalidInput` if `l_values` is empty or `lambda_values` has fewer than
/// `l_values.len() + 1` entries.
///
/// # Examples
///
/// ```
/// use spc_arl::experiment::ewma_grid;
///
/// let grid = ewma_grid(&[3.0, 2.9], &[0.4, 0.25, 0.1]).expect("enough lambdas");
/// let pairs: Vec<(f64, f64)> = grid.iter().map(|p| (p.l_factor, p.lambda)).collect();
/// assert_eq!(pairs, vec![(3.0, 0.4), (3.0, 0.25), (2.9, 0.25), (2.9, 0.1)]);
/// ```
pub fn ewma_grid(l_values: &[f64], lambda_values: &[f64]) -> Result<Vec<EwmaParams>> {
    if l_values.is_empty() {
        return Err(SpcError::InvalidInput("no L values given".to_string()));
    }
    if lambda_values.len() < l_values.len() + 1 {
        return Err(SpcError::InvalidInput(format!(
            "{} L values need at least {} lambda values, got {}",
            l_values.len(),
            l_values.len() + 1,
            lambda_values.len()
        )));
    }
    Ok(l_values
        .iter()
        .enumerate()
        .flat_map(|(j, &l_factor)| {
            lambda_values[j..j + 2]
                .iter()
                .map(move |&lambda| EwmaParams { l_factor, lambda })
        })
        .collect())
}

/// Estimates the empirical ARL of a Shewhart chart for every shift and
/// pairs it with the closed-form geometric ARL.
pub fn run_shewhart(experiment: &ShewhartExperiment) -> Result<Vec<ShewhartArlRow>> {
    let sim = &experiment.simulation;
    let fitted = ShewhartChart::new(experiment.k)?.fit_known(sim.mean, sim.sigma)?;
    debug!(k = experiment.k, limits = ?fitted.limits(), "fitted Shewhart chart");

    let mut rows = Vec::with_capacity(sim.deltas.len());
    for (d, &delta) in sim.deltas.iter().enumerate() {
        info!(delta, trials = sim.trials, "running Shewhart trials");
        let moments = fitted.run_length_moments(sim.shifted_mean(delta), sim.sigma)?;
        let summary = sim.run_trials(&fitted, delta, d as u64)?;
        if summary.empirical_arl.is_none() {
            warn!(delta, "every Shewhart trial was censored");
        }
        rows.push(ShewhartArlRow {
            delta,
            empirical_arl: summary.empirical_arl,
            theoretical_arl: moments.arl,
            theoretical_rl_stdev: moments.stdev,
            censored_trials: summary.censored,
        });
    }
    Ok(rows)
}

/// Estimates the empirical ARL of an EWMA chart for every grid pair and
/// shift. Rows are ordered by grid pair, then shift.
///
/// Run lengths are counted from the stabilization index and may be
/// negative for trials that signal before the limits stabilize.
pub fn run_ewma(experiment: &EwmaExperiment) -> Result<Vec<EwmaArlRow>> {
    let sim = &experiment.simulation;
    if experiment.grid.is_empty() {
        return Err(SpcError::InvalidInput("empty EWMA parameter grid".to_string()));
    }

    let mut rows = Vec::with_capacity(experiment.grid.len() * sim.deltas.len());
    for (g, params) in experiment.grid.iter().enumerate() {
        let fitted = EwmaChart::new(params.l_factor, params.lambda)?.fit(
            sim.sample_size,
            sim.mean,
            sim.sigma,
        )?;
        debug!(
            l_factor = params.l_factor,
            lambda = params.lambda,
            limits = ?fitted.steady_state_limits(),
            stabilization_index = fitted.stabilization_index(),
            "fitted EWMA chart"
        );

        for (d, &delta) in sim.deltas.iter().enumerate() {
            info!(
                delta,
                l_factor = params.l_factor,
                lambda = params.lambda,
                trials = sim.trials,
                "running EWMA trials"
            );
            let combination = (g * sim.deltas.len() + d) as u64;
            let summary = sim.run_trials(&fitted, delta, combination)?;
            if summary.empirical_arl.is_none() {
                warn!(
                    delta,
                    l_factor = params.l_factor,
                    lambda = params.lambda,
                    "every EWMA trial was censored"
                );
            }
            rows.push(EwmaArlRow {
                delta,
                l_factor: params.l_factor,
                lambda: params.lambda,
                empirical_arl: summary.empirical_arl,
                censored_trials: summary.censored,
            });
        }
    }
    Ok(rows)
}

/// Run length of one simulated sequence, `None` if it never signals.
fn run_trial<D: OutOfControlDetector>(
    detector: &D,
    normal: &Normal<f64>,
    sample_size: usize,
    seed: u64,
) -> Option<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f64> = (0..sample_size).map(|_| normal.sample(&mut rng)).collect();
    detector.first_violation(&data).map(|v| v.run_length())
}

fn summarize(run_lengths: &[Option<i64>]) -> RunLengthSummary {
    let observed: Vec<f64> = run_lengths.iter().flatten().map(|&rl| rl as f64).collect();
    RunLengthSummary {
        empirical_arl: u_optim::stats::mean(&observed),
        signalled: observed.len(),
        censored: run_lengths.len() - observed.len(),
    }
}

/// Seed for one trial, mixed so neighbouring trials get unrelated streams.
fn trial_seed(seed: u64, combination: u64, trial: u64) -> u64 {
    mix(mix(mix(seed) ^ combination) ^ trial)
}

/// SplitMix64 finalizer.
fn mix(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
