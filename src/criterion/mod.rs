//! Cost criteria for cross-validation.
//!
//! A [`Criterion`] maps observed responses and predictions to a cost. When it
//! also carries a casewise loss whose mean equals the criterion, the bias
//! adjustment and confidence interval can be computed; otherwise they are
//! omitted from the result.
//!
//! Built-in criteria:
//! - [`Criterion::mse`]: mean squared error (casewise)
//! - [`Criterion::mae`]: mean absolute error (casewise)
//! - [`Criterion::bayes_rule`]: misclassification rate at 0.5 (casewise)
//! - [`Criterion::rmse`]: root mean squared error (not casewise)
//! - [`Criterion::median_abs_err`]: median absolute error (not casewise)

use std::fmt;
use std::sync::Arc;

/// Criterion over the full response and prediction vectors.
pub type CriterionFn = dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync;

/// Loss for one observation and its prediction.
pub type LossFn = dyn Fn(f64, f64) -> f64 + Send + Sync;

/// A named cost function with an optional casewise decomposition.
///
/// # Examples
///
/// ```
/// use crossfold::criterion::Criterion;
///
/// let mse = Criterion::mse();
/// let y = [1.0, 2.0, 3.0];
/// let yhat = [1.0, 2.0, 5.0];
/// assert!((mse.evaluate(&y, &yhat) - 4.0 / 3.0).abs() < 1e-12);
/// assert!(mse.has_casewise_loss());
///
/// let rmse = Criterion::rmse();
/// assert!(!rmse.has_casewise_loss());
/// ```
#[derive(Clone)]
pub struct Criterion {
    name: String,
    value: Arc<CriterionFn>,
    casewise: Option<Arc<LossFn>>,
}

impl Criterion {
    /// Create a criterion without a casewise decomposition.
    pub fn new<F>(name: impl Into<String>, value: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value: Arc::new(value),
            casewise: None,
        }
    }

    /// Create a criterion defined as the mean of a casewise loss.
    pub fn from_casewise<L>(name: impl Into<String>, loss: L) -> Self
    where
        L: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let loss: Arc<LossFn> = Arc::new(loss);
        let inner = Arc::clone(&loss);
        Self {
            name: name.into(),
            value: Arc::new(move |y: &[f64], yhat: &[f64]| mean_loss(&*inner, y, yhat)),
            casewise: Some(loss),
        }
    }

    /// Attach a casewise loss to an existing criterion.
    ///
    /// The caller asserts that `mean(loss(y_i, yhat_i))` equals the criterion.
    #[must_use]
    pub fn with_casewise_loss<L>(mut self, loss: L) -> Self
    where
        L: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.casewise = Some(Arc::new(loss));
        self
    }

    /// Display name of the criterion.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the criterion.
    ///
    /// # Panics
    ///
    /// Panics if `y` and `yhat` have different lengths.
    #[must_use]
    pub fn evaluate(&self, y: &[f64], yhat: &[f64]) -> f64 {
        assert_eq!(y.len(), yhat.len(), "Vectors must have same length");
        (self.value)(y, yhat)
    }

    /// Returns true if the criterion decomposes into casewise losses.
    #[must_use]
    pub fn has_casewise_loss(&self) -> bool {
        self.casewise.is_some()
    }

    /// Per-case losses, or `None` if the criterion does not decompose.
    #[must_use]
    pub fn casewise_losses(&self, y: &[f64], yhat: &[f64]) -> Option<Vec<f64>> {
        let loss = self.casewise.as_ref()?;
        Some(y.iter().zip(yhat).map(|(&a, &b)| loss(a, b)).collect())
    }

    /// Mean squared error, `mean((y - yhat)^2)`.
    #[must_use]
    pub fn mse() -> Self {
        Self::from_casewise("mse", |y, yhat| (y - yhat).powi(2))
    }

    /// Mean absolute error, `mean(|y - yhat|)`.
    #[must_use]
    pub fn mae() -> Self {
        Self::from_casewise("mae", |y, yhat| (y - yhat).abs())
    }

    /// Root mean squared error. The square root breaks the casewise decomposition.
    #[must_use]
    pub fn rmse() -> Self {
        Self::new("rmse", |y, yhat| {
            if y.is_empty() {
                return f64::NAN;
            }
            let sum: f64 = y.iter().zip(yhat).map(|(a, b)| (a - b).powi(2)).sum();
            (sum / y.len() as f64).sqrt()
        })
    }

    /// Proportion of cases misclassified when predicted probabilities are
    /// cut at 0.5. Responses are coded 0/1.
    #[must_use]
    pub fn bayes_rule() -> Self {
        Self::from_casewise("BayesRule", |y, yhat| {
            let class = if yhat > 0.5 { 1.0 } else { 0.0 };
            if (y - class).abs() > f64::EPSILON {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Median absolute error.
    #[must_use]
    pub fn median_abs_err() -> Self {
        Self::new("medAbsErr", |y, yhat| {
            let mut errs: Vec<f64> = y.iter().zip(yhat).map(|(a, b)| (a - b).abs()).collect();
            median(&mut errs)
        })
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("name", &self.name)
            .field("casewise", &self.casewise.is_some())
            .finish()
    }
}

fn mean_loss(loss: &LossFn, y: &[f64], yhat: &[f64]) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    let total: f64 = y.iter().zip(yhat).map(|(&a, &b)| loss(a, b)).sum();
    total / y.len() as f64
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Y: [f64; 4] = [3.0, -0.5, 2.0, 7.0];
    const YHAT: [f64; 4] = [2.5, 0.0, 2.0, 8.0];

    #[test]
    fn test_mse() {
        let c = Criterion::mse();
        assert!((c.evaluate(&Y, &YHAT) - 0.375).abs() < 1e-12);
        assert_eq!(c.name(), "mse");
    }

    #[test]
    fn test_mae() {
        let c = Criterion::mae();
        assert!((c.evaluate(&Y, &YHAT) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rmse_is_not_casewise() {
        let c = Criterion::rmse();
        assert!((c.evaluate(&Y, &YHAT) - 0.375_f64.sqrt()).abs() < 1e-12);
        assert!(c.casewise_losses(&Y, &YHAT).is_none());
    }

    #[test]
    fn test_bayes_rule() {
        let c = Criterion::bayes_rule();
        let y = [0.0, 1.0, 1.0, 0.0];
        let p = [0.2, 0.9, 0.4, 0.7];
        assert!((c.evaluate(&y, &p) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_median_abs_err() {
        let c = Criterion::median_abs_err();
        // |errors| = 0.5, 0.5, 0.0, 1.0 -> sorted 0, .5, .5, 1
        assert!((c.evaluate(&Y, &YHAT) - 0.5).abs() < 1e-12);
        assert!(!c.has_casewise_loss());
    }

    #[test]
    fn test_casewise_mean_matches_criterion() {
        for c in [Criterion::mse(), Criterion::mae(), Criterion::bayes_rule()] {
            let losses = c.casewise_losses(&Y, &YHAT).expect("casewise");
            let mean = losses.iter().sum::<f64>() / losses.len() as f64;
            assert!((mean - c.evaluate(&Y, &YHAT)).abs() < 1e-12, "{}", c.name());
        }
    }

    #[test]
    fn test_with_casewise_loss_on_custom_criterion() {
        let c = Criterion::new("sse_mean", |y, yhat| {
            y.iter().zip(yhat).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / y.len() as f64
        });
        assert!(!c.has_casewise_loss());
        let c = c.with_casewise_loss(|y, yhat| (y - yhat).powi(2));
        assert!(c.has_casewise_loss());
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(Criterion::mse().evaluate(&[], &[]).is_nan());
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_length_mismatch_panics() {
        let _ = Criterion::mse().evaluate(&[1.0], &[1.0, 2.0]);
    }

    #[test]
    fn test_debug_shows_name() {
        let s = format!("{:?}", Criterion::mse());
        assert!(s.contains("mse"));
        assert!(s.contains("casewise: true"));
    }
}
