//! Reference model adapters.
//!
//! Small, dependency-free model families that implement the capability
//! traits in [`crate::traits`]:
//!
//! - [`LinearModel`]: ordinary least squares, for [`crate::cv::cv_cases`]
//! - [`RandomInterceptModel`]: linear mixed model with one random intercept,
//!   for [`crate::cv::cv_clusters`]
//! - [`ModelListSelection`]: picks among candidate linear models by inner
//!   cross-validation, for [`crate::cv::cv_select`]

mod linalg;
mod linear;
mod mixed;
mod select;

pub use linear::LinearModel;
pub use mixed::RandomInterceptModel;
pub use select::{Candidate, ModelListSelection};

use crate::data::DataFrame;
use crate::error::{CvError, Result};
use linalg::Design;

/// Name of the intercept coefficient.
pub const INTERCEPT: &str = "(Intercept)";

/// Intercept column followed by the named numeric predictors.
fn design(data: &DataFrame, predictors: &[String]) -> Result<Design> {
    let cols = predictors
        .iter()
        .map(|p| data.numeric(p))
        .collect::<Result<Vec<_>>>()?;
    let p = cols.len() + 1;
    let rows = data.n_rows();
    let mut values = Vec::with_capacity(rows * p);
    for i in 0..rows {
        values.push(1.0);
        values.extend(cols.iter().map(|c| c[i]));
    }
    Ok(Design {
        rows,
        cols: p,
        data: values,
    })
}

fn coefficient_names(predictors: &[String]) -> Vec<String> {
    std::iter::once(INTERCEPT.to_string())
        .chain(predictors.iter().cloned())
        .collect()
}

fn check_estimable(rows: usize, cols: usize) -> Result<()> {
    if rows <= cols {
        return Err(CvError::InvalidData(format!(
            "{rows} rows cannot estimate {cols} coefficients"
        )));
    }
    Ok(())
}
