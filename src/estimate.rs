//! Bias adjustment and confidence interval for a cross-validated criterion.
//!
//! With casewise loss `L`, out-of-fold predictions `yhat`, full-data
//! criterion `C_full` and per-fold criteria over all cases `C_j` (fold sizes
//! `n_j`):
//!
//! ```text
//! adjusted = CV + C_full - sum(n_j * C_j) / sum(n_j)
//! se       = sd(L(y, yhat)) / sqrt(n)
//! ci       = adjusted -/+ z_{(1 + level) / 2} * se
//! ```
//!
//! The interval under-covers for small `n`; orchestrators only request it
//! by default when `n >= 400`.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::criterion::Criterion;
use crate::error::{CvError, Result};
use crate::result::ConfidenceInterval;

/// Sample size at and above which the interval is computed by default.
pub const CONFINT_MIN_CASES: usize = 400;

/// Quantities the estimator needs from a finished run.
#[derive(Debug, Clone, Copy)]
pub struct BiasInputs<'a> {
    /// Observed response
    pub y: &'a [f64],
    /// Assembled out-of-fold predictions
    pub yhat: &'a [f64],
    /// `criterion(y, yhat)`
    pub cv_criterion: f64,
    /// Criterion of the full-data fit
    pub full_data_criterion: f64,
    /// Each fold's refit evaluated on all cases
    pub crit_all: &'a [f64],
    /// Number of held-out cases per fold
    pub fold_sizes: &'a [usize],
}

/// Bias-adjusted criterion with its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    /// Bias-adjusted criterion
    pub adjusted: f64,
    /// Standard error of the casewise losses' mean
    pub standard_error: f64,
    /// Interval, when requested
    pub confidence_interval: Option<ConfidenceInterval>,
}

/// Compute the bias adjustment, or `None` if the criterion is not casewise.
///
/// # Errors
///
/// - `InvalidRequest` if `level` is outside (0, 1)
/// - `DimensionMismatch` if input lengths disagree
pub fn bias_adjust(
    criterion: &Criterion,
    inputs: &BiasInputs<'_>,
    confint: bool,
    level: f64,
) -> Result<Option<Adjustment>> {
    validate_level(level)?;
    if inputs.y.len() != inputs.yhat.len() {
        return Err(CvError::dimension_mismatch(
            "out-of-fold predictions",
            inputs.y.len(),
            inputs.yhat.len(),
        ));
    }
    if inputs.crit_all.len() != inputs.fold_sizes.len() {
        return Err(CvError::dimension_mismatch(
            "per-fold criteria",
            inputs.fold_sizes.len(),
            inputs.crit_all.len(),
        ));
    }

    let Some(losses) = criterion.casewise_losses(inputs.y, inputs.yhat) else {
        return Ok(None);
    };

    let adjusted = inputs.cv_criterion + inputs.full_data_criterion
        - weighted_mean(inputs.crit_all, inputs.fold_sizes);
    let standard_error = sample_sd(&losses) / (losses.len() as f64).sqrt();

    let confidence_interval = if confint {
        let z = normal_quantile(1.0 - (1.0 - level) / 2.0)?;
        Some(ConfidenceInterval {
            lower: adjusted - z * standard_error,
            upper: adjusted + z * standard_error,
            level,
        })
    } else {
        None
    };

    Ok(Some(Adjustment {
        adjusted,
        standard_error,
        confidence_interval,
    }))
}

/// Mean of `values` weighted by `weights`, summed in index order.
#[must_use]
pub fn weighted_mean(values: &[f64], weights: &[usize]) -> f64 {
    let total: usize = weights.iter().sum();
    if total == 0 {
        return f64::NAN;
    }
    let sum: f64 = values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| v * w as f64)
        .sum();
    sum / total as f64
}

/// Standard deviation with the `n - 1` denominator; 0 for fewer than two values.
#[must_use]
pub fn sample_sd(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Standard normal quantile.
///
/// # Errors
///
/// Returns `InvalidRequest` if `p` is outside (0, 1).
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(CvError::InvalidRequest(format!(
            "probability must lie in (0, 1), got {p}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| CvError::InvalidRequest(format!("standard normal: {e}")))?;
    Ok(normal.inverse_cdf(p))
}

/// Confidence level must lie strictly between 0 and 1.
///
/// # Errors
///
/// Returns `InvalidRequest` otherwise.
pub fn validate_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(CvError::InvalidRequest(format!(
            "level must lie in (0, 1), got {level}"
        )))
    }
}
