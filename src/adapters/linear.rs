//! Ordinary least squares.

use super::linalg::cholesky_solve;
use super::{check_estimable, coefficient_names, design};
use crate::data::DataFrame;
use crate::error::Result;
use crate::result::Coefficients;
use crate::traits::{CvModel, Predictor, Response, ResponseProvider};

/// Linear model `y = b0 + sum(b_i x_i)` fit by least squares.
///
/// Solved through the normal equations `X^T X b = X^T y` with a Cholesky
/// decomposition.
///
/// # Examples
///
/// ```
/// use crossfold::adapters::LinearModel;
/// use crossfold::data::DataFrame;
/// use crossfold::traits::Predictor;
///
/// let data = DataFrame::from_numeric(vec![
///     ("x", vec![1.0, 2.0, 3.0, 4.0]),
///     ("y", vec![3.0, 5.0, 7.0, 9.0]),
/// ])
/// .expect("valid frame");
/// let model = LinearModel::fit(&data, "y", &["x"]).expect("fits");
/// let coef = model.coefficients().expect("has coefficients");
/// assert!((coef.get("x").expect("slope") - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    response: String,
    predictors: Vec<String>,
    coefficients: Coefficients,
    n_obs: usize,
}

impl LinearModel {
    /// Fit `response` on `predictors` (plus an intercept).
    ///
    /// # Errors
    ///
    /// - `ColumnNotFound` / `InvalidData` for missing or non-numeric columns
    /// - `InvalidData` when there are too few rows or the design is singular
    pub fn fit<S: AsRef<str>>(data: &DataFrame, response: &str, predictors: &[S]) -> Result<Self> {
        let predictors: Vec<String> = predictors.iter().map(|p| p.as_ref().to_string()).collect();
        Self::fit_named(data, response.to_string(), predictors)
    }

    fn fit_named(data: &DataFrame, response: String, predictors: Vec<String>) -> Result<Self> {
        let x = design(data, &predictors)?;
        check_estimable(x.rows, x.cols)?;
        let y = data.numeric(&response)?;
        let beta = cholesky_solve(&x.gram(), &x.cross(y))?;
        let coefficients = Coefficients::new(coefficient_names(&predictors), beta)?;
        Ok(Self {
            response,
            predictors,
            coefficients,
            n_obs: x.rows,
        })
    }

    /// Response column name.
    #[must_use]
    pub fn response_name(&self) -> &str {
        &self.response
    }

    /// Predictor column names.
    #[must_use]
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Rows the model was fit on.
    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }
}

impl ResponseProvider for LinearModel {
    fn response(&self, data: &DataFrame) -> Result<Response> {
        Ok(Response::Numeric(data.numeric(&self.response)?.to_vec()))
    }
}

impl Predictor for LinearModel {
    fn predict(&self, data: &DataFrame) -> Result<Vec<f64>> {
        Ok(design(data, &self.predictors)?.apply(self.coefficients.values()))
    }

    fn coefficients(&self) -> Option<Coefficients> {
        Some(self.coefficients.clone())
    }
}

impl CvModel for LinearModel {
    type Refit = Self;

    fn refit_excluding(&self, data: &DataFrame, excluded: &[usize]) -> Result<Self> {
        Self::fit_named(
            &data.without_rows(excluded),
            self.response.clone(),
            self.predictors.clone(),
        )
    }

    fn variables(&self) -> Option<Vec<String>> {
        Some(
            std::iter::once(self.response.clone())
                .chain(self.predictors.iter().cloned())
                .collect(),
        )
    }
}
