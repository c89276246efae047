//! Caller-facing options shared by every orchestrator.
//!
//! # Example
//!
//! ```rust
//! use crossfold::config::CvConfig;
//! use crossfold::model_selection::Folds;
//!
//! let config = CvConfig::new()
//!     .with_k(Folds::Count(5))
//!     .with_seed(1234)
//!     .with_reps(3)
//!     .with_ncores(2);
//! assert_eq!(config.reps, 3);
//!
//! let from_json = CvConfig::from_json(r#"{"k": "leave_one_out"}"#).expect("valid JSON");
//! assert_eq!(from_json.k, Some(Folds::LeaveOneOut));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CvError, Result};
use crate::estimate::{validate_level, CONFINT_MIN_CASES};
use crate::model_selection::Folds;
use crate::result::Diagnostic;

/// Folds used when `k` is not given and the orchestrator has no other default.
pub const DEFAULT_K: usize = 10;

/// Options for a cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// Fold count; `None` uses the orchestrator's default
    pub k: Option<Folds>,
    /// Number of replicates with independent folds
    pub reps: usize,
    /// Seed for the first replicate's permutation
    pub seed: Option<u64>,
    /// Keep per-fold criteria and coefficients; default `k <= 10`
    pub details: Option<bool>,
    /// Compute the confidence interval; default `n >= 400`
    pub confint: Option<bool>,
    /// Interval coverage level
    pub level: f64,
    /// Worker count; `1` runs folds sequentially
    pub ncores: usize,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            k: None,
            reps: 1,
            seed: None,
            details: None,
            confint: None,
            level: 0.95,
            ncores: 1,
        }
    }
}

impl CvConfig {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the fold count.
    #[must_use]
    pub fn with_k(mut self, k: impl Into<Folds>) -> Self {
        self.k = Some(k.into());
        self
    }

    /// Set the number of replicates.
    #[must_use]
    pub fn with_reps(mut self, reps: usize) -> Self {
        self.reps = reps;
        self
    }

    /// Set the seed for reproducible folds.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Keep or drop per-fold details.
    #[must_use]
    pub fn with_details(mut self, details: bool) -> Self {
        self.details = Some(details);
        self
    }

    /// Force the confidence interval on or off.
    #[must_use]
    pub fn with_confint(mut self, confint: bool) -> Self {
        self.confint = Some(confint);
        self
    }

    /// Set the interval coverage level.
    #[must_use]
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_ncores(mut self, ncores: usize) -> Self {
        self.ncores = ncores;
        self
    }

    /// Resolve options against `n` units (cases or clusters) and the
    /// orchestrator's default fold count. All validation happens here,
    /// before any fold work.
    ///
    /// # Errors
    ///
    /// - `InvalidFoldSpec` unless `2 <= k <= n`
    /// - `InvalidRequest` for `reps == 0`, `reps > 1` with leave-one-out,
    ///   a level outside (0, 1), or `ncores == 0`
    pub fn resolve(&self, n_units: usize, n_cases: usize, default_k: Folds) -> Result<Resolved> {
        let folds = self.k.unwrap_or(default_k);
        let k = folds.resolve(n_units);
        if k < 2 || k > n_units {
            return Err(CvError::InvalidFoldSpec {
                k,
                n: n_units,
                reason: "k must satisfy 2 <= k <= n".into(),
            });
        }
        let loo = k == n_units;

        if self.reps == 0 {
            return Err(CvError::InvalidRequest("reps must be at least 1".into()));
        }
        if loo && self.reps > 1 {
            return Err(CvError::InvalidRequest(
                "reps > 1 is meaningless for leave-one-out cross-validation".into(),
            ));
        }
        validate_level(self.level)?;
        if self.ncores == 0 {
            return Err(CvError::InvalidRequest("ncores must be at least 1".into()));
        }

        let mut diagnostics = Vec::new();
        let seed = match (loo, self.seed) {
            (true, Some(seed)) => {
                tracing::warn!(seed, "seed ignored for leave-one-out cross-validation");
                diagnostics.push(Diagnostic::SeedIgnored { seed });
                None
            }
            (true, None) => None,
            (false, seed) => seed,
        };

        Ok(Resolved {
            folds: Folds::Count(k),
            k,
            reps: self.reps,
            seed,
            details: self.details.unwrap_or(k <= DEFAULT_K),
            confint: self.confint.unwrap_or(n_cases >= CONFINT_MIN_CASES),
            level: self.level,
            ncores: self.ncores,
            diagnostics,
        })
    }
}

/// Options after validation against a concrete data set.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Concrete fold request
    pub folds: Folds,
    /// Concrete fold count
    pub k: usize,
    /// Number of replicates
    pub reps: usize,
    /// Seed for the first replicate (`None` for leave-one-out or to draw one)
    pub seed: Option<u64>,
    /// Keep per-fold details
    pub details: bool,
    /// Compute the confidence interval
    pub confint: bool,
    /// Interval coverage level
    pub level: f64,
    /// Worker count
    pub ncores: usize,
    /// Notices raised during resolution
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = CvConfig::default();
        assert_eq!(c.reps, 1);
        assert_eq!(c.level, 0.95);
        assert_eq!(c.ncores, 1);
        assert!(c.k.is_none());
    }

    #[test]
    fn test_resolve_default_details_and_confint() {
        let r = CvConfig::new()
            .resolve(1000, 1000, Folds::Count(DEFAULT_K))
            .expect("valid");
        assert_eq!(r.k, 10);
        assert!(r.details);
        assert!(r.confint);

        let r = CvConfig::new()
            .with_k(20)
            .resolve(100, 100, Folds::Count(DEFAULT_K))
            .expect("valid");
        assert!(!r.details);
        assert!(!r.confint);
    }

    #[test]
    fn test_resolve_overrides() {
        let r = CvConfig::new()
            .with_details(false)
            .with_confint(true)
            .resolve(50, 50, Folds::Count(5))
            .expect("valid");
        assert!(!r.details);
        assert!(r.confint);
    }

    #[test]
    fn test_reps_with_loo_rejected() {
        let err = CvConfig::new()
            .with_k(Folds::LeaveOneOut)
            .with_reps(2)
            .resolve(20, 20, Folds::Count(DEFAULT_K))
            .unwrap_err();
        assert!(matches!(err, CvError::InvalidRequest(_)));
    }

    #[test]
    fn test_seed_with_loo_becomes_notice() {
        let r = CvConfig::new()
            .with_k(Folds::LeaveOneOut)
            .with_seed(99)
            .resolve(12, 12, Folds::Count(DEFAULT_K))
            .expect("valid");
        assert_eq!(r.seed, None);
        assert_eq!(r.diagnostics, vec![Diagnostic::SeedIgnored { seed: 99 }]);
    }

    #[test]
    fn test_invalid_options() {
        let base = CvConfig::new();
        assert!(matches!(
            base.clone().with_k(1).resolve(10, 10, Folds::Count(5)),
            Err(CvError::InvalidFoldSpec { .. })
        ));
        assert!(matches!(
            base.clone().with_k(11).resolve(10, 10, Folds::Count(5)),
            Err(CvError::InvalidFoldSpec { .. })
        ));
        assert!(base.clone().with_reps(0).resolve(10, 10, Folds::Count(5)).is_err());
        assert!(base.clone().with_level(1.0).resolve(10, 10, Folds::Count(5)).is_err());
        assert!(base.with_ncores(0).resolve(10, 10, Folds::Count(5)).is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let c = CvConfig::from_json(r#"{"k": {"count": 5}, "reps": 3, "seed": 7}"#)
            .expect("valid JSON");
        assert_eq!(c.k, Some(Folds::Count(5)));
        assert_eq!(c.reps, 3);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.level, 0.95);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            CvConfig::from_json("{reps: }"),
            Err(CvError::Serialization(_))
        ));
    }
}
