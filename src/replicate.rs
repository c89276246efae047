//! Replication aggregator.
//!
//! Runs a cross-validation procedure `reps` times with independently drawn
//! fold permutations and summarizes the spread of the estimates.

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::estimate::sample_sd;
use crate::model_selection::draw_seed;
use crate::result::{CvOutcome, CvResult, Diagnostic, ReplicatedCvResult};

/// Mean, standard deviation and range of one statistic across replicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    /// Mean across replicates
    pub mean: f64,
    /// Standard deviation (`n - 1` denominator)
    pub sd: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

impl Spread {
    fn of(values: &[f64]) -> Self {
        let mean = if values.is_empty() {
            f64::NAN
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        Self {
            mean,
            sd: sample_sd(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Width of the range.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Summary of a replicated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateSummary {
    /// Number of replicates summarized
    pub reps: usize,
    /// Spread of `cv_criterion`
    pub cv_criterion: Spread,
    /// Spread of `adjusted_cv_criterion`, when every replicate has one
    pub adjusted_cv_criterion: Option<Spread>,
}

/// Summarize replicate results. Pure function of its input.
#[must_use]
pub fn summarize(replicates: &[CvResult]) -> ReplicateSummary {
    let cv: Vec<f64> = replicates.iter().map(|r| r.cv_criterion).collect();
    let adjusted: Option<Vec<f64>> = replicates
        .iter()
        .map(|r| r.adjusted_cv_criterion)
        .collect();

    ReplicateSummary {
        reps: replicates.len(),
        cv_criterion: Spread::of(&cv),
        adjusted_cv_criterion: adjusted.filter(|a| !a.is_empty()).map(|a| Spread::of(&a)),
    }
}

/// Seeds for each replicate: the first is supplied or drawn, the rest come
/// from an `StdRng` seeded with the first, so one seed replays the whole run.
#[must_use]
pub fn replicate_seeds(first: u64, reps: usize) -> Vec<u64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(first);
    let mut seeds = Vec::with_capacity(reps);
    seeds.push(first);
    while seeds.len() < reps {
        seeds.push(rng.gen_range(1..=1_000_000));
    }
    seeds
}

/// Run `run` once per replicate and package the results.
///
/// `loo` runs use no seed and a single replicate. Otherwise a missing seed
/// is drawn, logged and recorded as a [`Diagnostic::SeedDrawn`] on the first
/// replicate's result.
///
/// # Errors
///
/// The first failing replicate aborts the run.
pub fn replicate<F>(reps: usize, loo: bool, seed: Option<u64>, mut run: F) -> Result<CvOutcome>
where
    F: FnMut(Option<u64>) -> Result<CvResult>,
{
    if loo {
        return Ok(CvOutcome::Single(run(None)?));
    }

    let (first, drawn) = match seed {
        Some(s) => (s, false),
        None => {
            let s = draw_seed();
            tracing::info!(seed = s, "drew random seed for cross-validation folds");
            (s, true)
        }
    };

    let mut results = Vec::with_capacity(reps);
    for (r, seed) in replicate_seeds(first, reps).into_iter().enumerate() {
        tracing::debug!(replicate = r + 1, seed, "starting replicate");
        let mut result = run(Some(seed))?;
        if drawn && r == 0 {
            result.diagnostics.push(Diagnostic::SeedDrawn { seed });
        }
        results.push(result);
    }

    if results.len() == 1 {
        Ok(CvOutcome::Single(results.remove(0)))
    } else {
        Ok(CvOutcome::Replicated(ReplicatedCvResult::new(results)))
    }
}
