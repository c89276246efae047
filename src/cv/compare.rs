//! Comparison of competing models over identical folds.

use serde::{Deserialize, Serialize};

use super::cv_cases;
use crate::config::{CvConfig, DEFAULT_K};
use crate::criterion::Criterion;
use crate::data::DataFrame;
use crate::error::{CvError, Result};
use crate::model_selection::{draw_seed, Folds};
use crate::result::{CvOutcome, Diagnostic};
use crate::traits::CvModel;

/// One named model's cross-validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    /// Label given by the caller
    pub name: String,
    /// Outcome of [`cv_cases`] for this model
    pub outcome: CvOutcome,
}

/// Outcomes of several models cross-validated with the same folds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    entries: Vec<ComparisonEntry>,
}

impl ModelComparison {
    /// Entries in the order the models were supplied.
    #[must_use]
    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }

    /// Outcome for the model named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CvOutcome> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.outcome)
    }

    /// Name of the model with the smallest first-replicate
    /// `adjusted_cv_criterion`, falling back to `cv_criterion`.
    #[must_use]
    pub fn best(&self) -> Option<&str> {
        let score = |e: &ComparisonEntry| {
            e.outcome
                .results()
                .first()
                .map_or(f64::INFINITY, |r| {
                    r.adjusted_cv_criterion.unwrap_or(r.cv_criterion)
                })
        };
        self.entries
            .iter()
            .min_by(|a, b| score(a).total_cmp(&score(b)))
            .map(|e| e.name.as_str())
    }

    /// Number of models compared.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no models were compared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the comparison to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Cross-validate several models with identical fold assignments.
///
/// When no seed is configured, one is drawn up front and shared, so every
/// model sees the same folds (and the same replicate seeds).
///
/// # Errors
///
/// - `InvalidRequest` for an empty model list or duplicate names
/// - any error from [`cv_cases`] for an individual model
pub fn cv_models<M: CvModel>(
    models: &[(&str, &M)],
    data: &DataFrame,
    criterion: &Criterion,
    config: &CvConfig,
) -> Result<ModelComparison> {
    if models.is_empty() {
        return Err(CvError::InvalidRequest("no models to compare".into()));
    }
    for (i, (name, _)) in models.iter().enumerate() {
        if models[..i].iter().any(|(other, _)| other == name) {
            return Err(CvError::InvalidRequest(format!(
                "duplicate model name '{name}'"
            )));
        }
    }

    let n = data.n_rows();
    let resolved = config.resolve(n, n, Folds::Count(DEFAULT_K))?;
    let loo = resolved.k == n;

    let mut shared = config.clone();
    let mut drawn = None;
    if !loo && config.seed.is_none() {
        let seed = draw_seed();
        tracing::info!(seed, "drew random seed shared by compared models");
        shared.seed = Some(seed);
        drawn = Some(seed);
    }

    let mut entries = Vec::with_capacity(models.len());
    for (name, model) in models {
        tracing::debug!(model = *name, "cross-validating model");
        let mut outcome =
            cv_cases(*model, data, criterion, &shared).map_err(|e| e.in_context(name))?;
        if let Some(seed) = drawn {
            mark_seed_drawn(&mut outcome, seed);
        }
        entries.push(ComparisonEntry {
            name: (*name).to_string(),
            outcome,
        });
    }
    Ok(ModelComparison { entries })
}

fn mark_seed_drawn(outcome: &mut CvOutcome, seed: u64) {
    let first = match outcome {
        CvOutcome::Single(r) => Some(r),
        CvOutcome::Replicated(r) => r.replicates_mut().first_mut(),
    };
    if let Some(r) = first {
        r.diagnostics.push(Diagnostic::SeedDrawn { seed });
    }
}
