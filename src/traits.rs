//! Capability contracts consumed from model adapters.
//!
//! Orchestrators depend only on these traits. One adapter per model family
//! implements them; see [`crate::adapters`] for reference implementations.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;
use crate::data::{Column, DataFrame};
use crate::error::{CvError, Result};
use crate::result::{Coefficients, FoldFit};

/// Response values as extracted from a model or expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Numeric vector.
    Numeric(Vec<f64>),
    /// Categorical labels; two levels are coded 0/1.
    Categorical(Vec<String>),
    /// A multi-column response, which cross-validation cannot use.
    Matrix {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },
}

impl Response {
    /// Convert to the numeric vector criteria operate on.
    ///
    /// A two-level categorical response is coded 0 for the first level and
    /// 1 for the second, levels in sorted order.
    ///
    /// # Errors
    ///
    /// - `NonVectorResponse` for a matrix response
    /// - `NonNumericResponse` for a categorical response with more than two levels
    pub fn into_numeric(self) -> Result<Vec<f64>> {
        match self {
            Self::Numeric(v) => Ok(v),
            Self::Matrix { rows, cols } => Err(CvError::NonVectorResponse(format!(
                "response is a {rows}x{cols} matrix"
            ))),
            Self::Categorical(labels) => {
                let mut levels: Vec<&str> = labels.iter().map(String::as_str).collect();
                levels.sort_unstable();
                levels.dedup();
                if levels.len() > 2 {
                    return Err(CvError::NonNumericResponse(format!(
                        "categorical response has {} levels, expected at most 2",
                        levels.len()
                    )));
                }
                let positive = levels.get(1).copied();
                Ok(labels
                    .iter()
                    .map(|l| if Some(l.as_str()) == positive { 1.0 } else { 0.0 })
                    .collect())
            }
        }
    }
}

/// Anything that can report the response it was fit to.
pub trait ResponseProvider: Send + Sync {
    /// Extract the response vector for `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the response cannot be extracted.
    fn response(&self, data: &DataFrame) -> Result<Response>;
}

/// A fitted model that predicts every row of a frame.
pub trait Predictor: Send + Sync {
    /// Predict one value per row of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails.
    fn predict(&self, data: &DataFrame) -> Result<Vec<f64>>;

    /// Coefficient vector, if the model has one.
    fn coefficients(&self) -> Option<Coefficients> {
        None
    }
}

/// A fitted model that can be refit with cases removed.
///
/// Assumes independent observations.
pub trait CvModel: Predictor + ResponseProvider {
    /// Type of the refit model.
    type Refit: Predictor;

    /// Refit on `data` with the `excluded` rows removed.
    ///
    /// # Errors
    ///
    /// Refit failures are fatal to the run.
    fn refit_excluding(&self, data: &DataFrame, excluded: &[usize]) -> Result<Self::Refit>;

    /// Variables the model refers to, for a consistency check against the data.
    fn variables(&self) -> Option<Vec<String>> {
        None
    }

    /// Refit without `held_out` and predict every case.
    ///
    /// Adapters with closed-form deletion updates may override this.
    ///
    /// # Errors
    ///
    /// Propagates refit and prediction failures.
    fn refit_and_predict(&self, data: &DataFrame, held_out: &[usize]) -> Result<FoldFit> {
        let refit = self.refit_excluding(data, held_out)?;
        let all = refit.predict(data)?;
        if all.len() != data.n_rows() {
            return Err(CvError::dimension_mismatch(
                "refit predictions",
                data.n_rows(),
                all.len(),
            ));
        }
        let held_out = held_out.iter().map(|&i| all[i]).collect();
        Ok(FoldFit {
            held_out,
            all,
            coefficients: refit.coefficients(),
            model_identity: None,
        })
    }
}

/// Which effects enter a mixed-model prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Fixed effects only (population-level prediction).
    FixedOnly,
    /// Fixed effects plus predicted random effects (BLUPs).
    FixedAndRandom,
}

/// A fitted mixed-effects model.
pub trait MixedPredictor: Send + Sync {
    /// Predict one value per row of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails.
    fn predict(&self, data: &DataFrame, mode: PredictionMode) -> Result<Vec<f64>>;

    /// Fixed-effect coefficient vector.
    fn fixed_effects(&self) -> Coefficients;
}

/// A mixed-effects model that can be refit with cases removed.
pub trait MixedModel: MixedPredictor + ResponseProvider {
    /// Type of the refit model.
    type Refit: MixedPredictor;

    /// Refit with the `excluded` rows removed. Convergence trouble should be
    /// reported by the adapter, which returns its best effort.
    ///
    /// # Errors
    ///
    /// Refit failures are fatal to the run.
    fn refit_excluding(&self, data: &DataFrame, excluded: &[usize]) -> Result<Self::Refit>;

    /// Variables the model refers to, for a consistency check against the data.
    fn variables(&self) -> Option<Vec<String>> {
        None
    }
}

/// Inputs a selection procedure needs besides the data.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Response for every case
    pub y: &'a [f64],
    /// Criterion to evaluate selected models with
    pub criterion: &'a Criterion,
    /// Fold being run, `None` for the full-data baseline
    pub fold: Option<usize>,
}

/// What a selection procedure returns for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Predictions for the held-out cases (empty for the full-data run)
    pub held_out_predictions: Vec<f64>,
    /// Criterion over ALL cases under this invocation's selected model
    pub criterion_all: f64,
    /// Coefficients of the selected model
    pub coefficients: Option<Coefficients>,
    /// Identity of the selected model
    pub model_identity: Option<String>,
}

/// A complete model-selection procedure, re-run per fold.
pub trait SelectionProcedure: Send + Sync {
    /// Run the procedure on `data` without the `held_out` rows (or on all
    /// rows when `held_out` is `None`).
    ///
    /// # Errors
    ///
    /// Procedure failures are fatal to the run.
    fn select(
        &self,
        data: &DataFrame,
        held_out: Option<&[usize]>,
        ctx: &SelectionContext<'_>,
    ) -> Result<Selection>;
}

type ExprFn = dyn Fn(&DataFrame) -> Result<Response> + Send + Sync;

/// A response evaluated against the data rather than read from a model.
#[derive(Clone)]
pub struct ResponseExpr {
    label: String,
    eval: Arc<ExprFn>,
}

impl ResponseExpr {
    /// Arbitrary expression over the data.
    pub fn new<F>(label: impl Into<String>, eval: F) -> Self
    where
        F: Fn(&DataFrame) -> Result<Response> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            eval: Arc::new(eval),
        }
    }

    /// The response is the named column.
    #[must_use]
    pub fn column(name: &str) -> Self {
        let owned = name.to_string();
        Self::new(name, move |data: &DataFrame| {
            Ok(match data.column(&owned)? {
                Column::Numeric(v) => Response::Numeric(v.clone()),
                Column::Categorical(v) => Response::Categorical(v.clone()),
            })
        })
    }

    /// Label shown in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluate against `data`.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures.
    pub fn evaluate(&self, data: &DataFrame) -> Result<Response> {
        (self.eval)(data)
    }
}

impl fmt::Debug for ResponseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseExpr")
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant {
        value: f64,
    }

    impl Predictor for Constant {
        fn predict(&self, data: &DataFrame) -> Result<Vec<f64>> {
            Ok(vec![self.value; data.n_rows()])
        }
    }

    impl ResponseProvider for Constant {
        fn response(&self, data: &DataFrame) -> Result<Response> {
            Ok(Response::Numeric(data.numeric("y")?.to_vec()))
        }
    }

    impl CvModel for Constant {
        type Refit = Constant;

        fn refit_excluding(&self, data: &DataFrame, excluded: &[usize]) -> Result<Self::Refit> {
            let kept = data.without_rows(excluded);
            let y = kept.numeric("y")?;
            Ok(Constant {
                value: y.iter().sum::<f64>() / y.len() as f64,
            })
        }
    }

    #[test]
    fn test_default_refit_and_predict_restricts_to_held_out() {
        let data = DataFrame::from_numeric(vec![("y", vec![1.0, 2.0, 3.0, 10.0])])
            .expect("valid frame");
        let model = Constant { value: 4.0 };
        let fit = model.refit_and_predict(&data, &[3]).expect("refit");
        assert_eq!(fit.held_out, vec![2.0]);
        assert_eq!(fit.all, vec![2.0; 4]);
        assert!(fit.coefficients.is_none());
    }

    #[test]
    fn test_numeric_response_passes_through() {
        let r = Response::Numeric(vec![1.0, 2.0]);
        assert_eq!(r.into_numeric().expect("numeric"), vec![1.0, 2.0]);
    }

    #[test]
    fn test_two_level_categorical_is_coded() {
        let r = Response::Categorical(vec!["yes".into(), "no".into(), "yes".into()]);
        assert_eq!(r.into_numeric().expect("binary"), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_many_level_categorical_fails() {
        let r = Response::Categorical(vec!["a".into(), "b".into(), "c".into()]);
        assert!(matches!(r.into_numeric(), Err(CvError::NonNumericResponse(_))));
    }

    #[test]
    fn test_matrix_response_fails() {
        let r = Response::Matrix { rows: 10, cols: 2 };
        assert!(matches!(r.into_numeric(), Err(CvError::NonVectorResponse(_))));
    }

    #[test]
    fn test_response_expr_column() {
        let data = DataFrame::from_numeric(vec![("y", vec![1.0, 2.0])]).expect("valid");
        let expr = ResponseExpr::column("y");
        assert_eq!(expr.label(), "y");
        assert_eq!(
            expr.evaluate(&data).expect("column exists"),
            Response::Numeric(vec![1.0, 2.0])
        );
        assert!(ResponseExpr::column("z").evaluate(&data).is_err());
    }
}
