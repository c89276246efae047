//! Result objects returned by cross-validation runs.
//!
//! Field names of [`CvResult`] are the stable external contract; results
//! serialize to a nested JSON mapping with those names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CvError, Result};

/// Named numeric coefficient vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coefficients {
    names: Vec<String>,
    values: Vec<f64>,
}

impl Coefficients {
    /// Create a coefficient vector from parallel names and values.
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(CvError::dimension_mismatch(
                "coefficient names",
                values.len(),
                names.len(),
            ));
        }
        Ok(Self { names, values })
    }

    /// Create a coefficient vector from `(name, value)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values) = pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self { names, values }
    }

    /// Coefficient names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Coefficient values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a coefficient by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Number of coefficients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no coefficients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What one fold's refit produced. Consumed into the run's aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldFit {
    /// Predictions for the held-out cases, in held-out order.
    pub held_out: Vec<f64>,
    /// Predictions for every case under this fold's refit.
    pub all: Vec<f64>,
    /// Coefficients of the refit model.
    pub coefficients: Option<Coefficients>,
    /// Identity of the selected model, for selection procedures.
    pub model_identity: Option<String>,
}

/// Normal-theory interval around the bias-adjusted criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
    /// Coverage level, e.g. 0.95
    pub level: f64,
}

/// Per-fold information kept when `details` is requested.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FoldDetails {
    /// Criterion over each fold's held-out cases
    pub per_fold_criterion: Vec<f64>,
    /// Coefficients of each fold's refit
    pub per_fold_coefficients: Vec<Option<Coefficients>>,
    /// Selected model of each fold (selection procedures only)
    pub per_fold_model_identity: Vec<Option<String>>,
}

/// Granularity of clustered cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Whole clusters held out; fixed-effect predictions.
    Clusters,
    /// Individual cases held out; fixed plus random-effect predictions.
    Cases,
}

/// Description of a clustered run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    /// Refit/predict granularity
    pub mode: ClusterMode,
    /// Variables defining clusters (empty in case mode)
    pub cluster_variables: Vec<String>,
    /// Number of distinct clusters (cluster mode only)
    pub n_clusters: Option<usize>,
}

/// Non-fatal condition reported alongside a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No seed was supplied; this one was drawn and used.
    SeedDrawn {
        /// Seed used for the fold permutation
        seed: u64,
    },
    /// A seed was supplied for leave-one-out folds and ignored.
    SeedIgnored {
        /// The ignored seed
        seed: u64,
    },
    /// Variables the model refers to are absent from the data.
    FormulaMismatch {
        /// Missing variable names
        missing: Vec<String>,
    },
    /// The criterion has no casewise loss; no bias adjustment or interval.
    NoCasewiseLoss {
        /// Criterion name
        criterion: String,
    },
    /// Parallel execution was requested but is unavailable.
    SequentialFallback {
        /// Requested worker count
        requested: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeedDrawn { seed } => write!(f, "random seed set to {seed}"),
            Self::SeedIgnored { seed } => {
                write!(f, "seed {seed} ignored for leave-one-out cross-validation")
            }
            Self::FormulaMismatch { missing } => write!(
                f,
                "variables in the model are missing from the data: {}",
                missing.join(", ")
            ),
            Self::NoCasewiseLoss { criterion } => write!(
                f,
                "criterion '{criterion}' has no casewise loss; bias adjustment and confidence interval omitted"
            ),
            Self::SequentialFallback { requested } => write!(
                f,
                "{requested} workers requested but parallel execution is not compiled in; ran sequentially"
            ),
        }
    }
}

/// Result of one cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    /// Criterion over the assembled out-of-fold predictions
    pub cv_criterion: f64,
    /// Bias-adjusted criterion; present iff the criterion is casewise
    pub adjusted_cv_criterion: Option<f64>,
    /// Criterion of the full-data fit
    pub full_data_criterion: f64,
    /// Interval around the adjusted criterion, when requested
    pub confidence_interval: Option<ConfidenceInterval>,
    /// Standard error of the adjusted criterion
    pub standard_error: Option<f64>,
    /// Number of folds
    pub k: usize,
    /// Seed of the fold permutation; `None` for leave-one-out
    pub seed: Option<u64>,
    /// Criterion display name
    pub criterion_name: String,
    /// Coefficients of the full-data model
    pub coefficients: Option<Coefficients>,
    /// Per-fold details, when requested
    pub details: Option<FoldDetails>,
    /// Clustered-run description
    pub cluster_info: Option<ClusterInfo>,
    /// Model chosen by a selection procedure on the full data
    pub selected_model: Option<String>,
    /// Non-fatal conditions met during the run
    pub diagnostics: Vec<Diagnostic>,
}

impl CvResult {
    /// Serialize to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Ordered results of replicated cross-validation, one per replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedCvResult {
    replicates: Vec<CvResult>,
}

impl ReplicatedCvResult {
    /// Wrap an ordered sequence of replicate results.
    #[must_use]
    pub fn new(replicates: Vec<CvResult>) -> Self {
        Self { replicates }
    }

    /// Replicate results in run order.
    #[must_use]
    pub fn replicates(&self) -> &[CvResult] {
        &self.replicates
    }

    pub(crate) fn replicates_mut(&mut self) -> &mut [CvResult] {
        &mut self.replicates
    }

    /// Number of replicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.replicates.len()
    }

    /// Returns true if there are no replicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replicates.is_empty()
    }

    /// Cross-replicate mean, SD and range. Pure; recomputed on each call.
    #[must_use]
    pub fn summarize(&self) -> crate::replicate::ReplicateSummary {
        crate::replicate::summarize(&self.replicates)
    }

    /// Serialize to a JSON array of results.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.replicates)?)
    }
}

/// What an orchestrator returns: one result, or one per replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CvOutcome {
    /// `reps == 1`
    Single(CvResult),
    /// `reps > 1`
    Replicated(ReplicatedCvResult),
}

impl CvOutcome {
    /// The single result, if this run was not replicated.
    #[must_use]
    pub fn as_single(&self) -> Option<&CvResult> {
        match self {
            Self::Single(r) => Some(r),
            Self::Replicated(_) => None,
        }
    }

    /// The replicated results, if this run was replicated.
    #[must_use]
    pub fn as_replicated(&self) -> Option<&ReplicatedCvResult> {
        match self {
            Self::Single(_) => None,
            Self::Replicated(r) => Some(r),
        }
    }

    /// All results in order (one element when not replicated).
    #[must_use]
    pub fn results(&self) -> &[CvResult] {
        match self {
            Self::Single(r) => std::slice::from_ref(r),
            Self::Replicated(r) => r.replicates(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(cv: f64, adjusted: Option<f64>) -> CvResult {
        CvResult {
            cv_criterion: cv,
            adjusted_cv_criterion: adjusted,
            full_data_criterion: cv * 0.9,
            confidence_interval: None,
            standard_error: adjusted.map(|_| 0.1),
            k: 5,
            seed: Some(42),
            criterion_name: "mse".into(),
            coefficients: None,
            details: None,
            cluster_info: None,
            selected_model: None,
            diagnostics: vec![],
        }
    }

    #[test]
    fn test_coefficients_new_checks_length() {
        assert!(Coefficients::new(vec!["a".into()], vec![1.0, 2.0]).is_err());
        let c = Coefficients::new(vec!["a".into(), "b".into()], vec![1.0, 2.0])
            .expect("equal lengths");
        assert_eq!(c.get("b"), Some(2.0));
        assert_eq!(c.get("z"), None);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_coefficients_from_pairs() {
        let c = Coefficients::from_pairs([("(Intercept)", 1.5), ("x", -0.5)]);
        assert_eq!(c.names(), &["(Intercept)".to_string(), "x".to_string()]);
        assert_eq!(c.values(), &[1.5, -0.5]);
    }

    #[test]
    fn test_json_uses_contract_field_names() {
        let json = result_with(2.0, Some(1.9)).to_json().expect("serializable");
        for field in [
            "cv_criterion",
            "adjusted_cv_criterion",
            "full_data_criterion",
            "confidence_interval",
            "standard_error",
            "criterion_name",
            "cluster_info",
        ] {
            assert!(json.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_json_roundtrip_preserves_result() {
        let original = result_with(2.0, None);
        let json = original.to_json().expect("serializable");
        let back: CvResult = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(original, back);
    }

    #[test]
    fn test_outcome_results_slice() {
        let single = CvOutcome::Single(result_with(1.0, None));
        assert_eq!(single.results().len(), 1);
        assert!(single.as_replicated().is_none());

        let reps = CvOutcome::Replicated(ReplicatedCvResult::new(vec![
            result_with(1.0, None),
            result_with(2.0, None),
        ]));
        assert_eq!(reps.results().len(), 2);
        assert!(reps.as_single().is_none());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::NoCasewiseLoss {
            criterion: "rmse".into(),
        };
        assert!(d.to_string().contains("rmse"));
        let d = Diagnostic::FormulaMismatch {
            missing: vec!["x2".into(), "x3".into()],
        };
        assert!(d.to_string().contains("x2, x3"));
    }
}
