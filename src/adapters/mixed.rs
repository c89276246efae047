//! Linear mixed model with a single random intercept.

use std::collections::BTreeMap;

use super::linalg::{cholesky_solve, Design};
use super::{check_estimable, coefficient_names, design};
use crate::data::{ClusterKey, DataFrame};
use crate::error::{CvError, Result};
use crate::result::Coefficients;
use crate::traits::{MixedModel, MixedPredictor, PredictionMode, Response, ResponseProvider};

/// `y = X b + u[cluster] + e` with `var(u) / var(e)` held at a known ratio.
///
/// Fixed effects are the generalized least squares estimates under the
/// implied compound-symmetric covariance. Random effects are their BLUPs,
/// the cluster mean residual shrunk by `n_c r / (1 + n_c r)` for a cluster
/// of `n_c` cases and ratio `r`. Cases from clusters not seen in the fit
/// get a random effect of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomInterceptModel {
    response: String,
    predictors: Vec<String>,
    cluster_variables: Vec<String>,
    variance_ratio: f64,
    fixed: Coefficients,
    blups: BTreeMap<ClusterKey, f64>,
}

impl RandomInterceptModel {
    /// Fit the model.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a negative or non-finite `variance_ratio`
    /// - column lookup errors and `InvalidData` for an inestimable design
    pub fn fit<S: AsRef<str>, C: AsRef<str>>(
        data: &DataFrame,
        response: &str,
        predictors: &[S],
        cluster_variables: &[C],
        variance_ratio: f64,
    ) -> Result<Self> {
        if !variance_ratio.is_finite() || variance_ratio < 0.0 {
            return Err(CvError::InvalidRequest(format!(
                "variance ratio must be finite and non-negative, got {variance_ratio}"
            )));
        }
        Self::fit_named(
            data,
            response.to_string(),
            predictors.iter().map(|p| p.as_ref().to_string()).collect(),
            cluster_variables
                .iter()
                .map(|c| c.as_ref().to_string())
                .collect(),
            variance_ratio,
        )
    }

    fn fit_named(
        data: &DataFrame,
        response: String,
        predictors: Vec<String>,
        cluster_variables: Vec<String>,
        variance_ratio: f64,
    ) -> Result<Self> {
        let x = design(data, &predictors)?;
        check_estimable(x.rows, x.cols)?;
        let y = data.numeric(&response)?;
        let groups = group_rows(&data.cluster_keys(&cluster_variables)?);

        let beta = gls(&x, y, &groups, variance_ratio)?;
        let fitted = x.apply(&beta);
        let blups = groups
            .into_iter()
            .map(|(key, rows)| {
                let n_c = rows.len() as f64;
                let resid: f64 = rows.iter().map(|&i| y[i] - fitted[i]).sum();
                (key, variance_ratio * resid / (1.0 + n_c * variance_ratio))
            })
            .collect();

        Ok(Self {
            fixed: Coefficients::new(coefficient_names(&predictors), beta)?,
            response,
            predictors,
            cluster_variables,
            variance_ratio,
            blups,
        })
    }

    /// Predicted random intercept of a cluster seen in the fit, given its
    /// grouping values in variable order.
    #[must_use]
    pub fn random_effect<S: AsRef<str>>(&self, cluster: &[S]) -> Option<f64> {
        let key: ClusterKey = cluster.iter().map(|v| v.as_ref().to_string()).collect();
        self.blups.get(&key).copied()
    }

    /// Number of clusters in the fit.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.blups.len()
    }

    /// `var(u) / var(e)`.
    #[must_use]
    pub fn variance_ratio(&self) -> f64 {
        self.variance_ratio
    }
}

fn group_rows(keys: &[ClusterKey]) -> BTreeMap<ClusterKey, Vec<usize>> {
    let mut groups: BTreeMap<ClusterKey, Vec<usize>> = BTreeMap::new();
    for (i, key) in keys.iter().enumerate() {
        groups.entry(key.clone()).or_default().push(i);
    }
    groups
}

/// Per cluster, `V^-1` is proportional to `I - w J` with
/// `w = r / (1 + n_c r)`, so the GLS normal equations subtract a rank-one
/// term built from the cluster's column sums.
fn gls(
    x: &Design,
    y: &[f64],
    groups: &BTreeMap<ClusterKey, Vec<usize>>,
    ratio: f64,
) -> Result<Vec<f64>> {
    let p = x.cols;
    let mut a = x.gram();
    let mut b = x.cross(y);

    for rows in groups.values() {
        let w = ratio / (1.0 + rows.len() as f64 * ratio);
        let mut s = vec![0.0; p];
        let mut sy = 0.0;
        for &i in rows {
            for (sj, xj) in s.iter_mut().zip(x.row(i)) {
                *sj += xj;
            }
            sy += y[i];
        }
        for r in 0..p {
            b[r] -= w * s[r] * sy;
            for c in 0..p {
                a[r * p + c] -= w * s[r] * s[c];
            }
        }
    }
    cholesky_solve(&a, &b)
}

impl ResponseProvider for RandomInterceptModel {
    fn response(&self, data: &DataFrame) -> Result<Response> {
        Ok(Response::Numeric(data.numeric(&self.response)?.to_vec()))
    }
}

impl MixedPredictor for RandomInterceptModel {
    fn predict(&self, data: &DataFrame, mode: PredictionMode) -> Result<Vec<f64>> {
        let fixed = design(data, &self.predictors)?.apply(self.fixed.values());
        match mode {
            PredictionMode::FixedOnly => Ok(fixed),
            PredictionMode::FixedAndRandom => {
                let keys = data.cluster_keys(&self.cluster_variables)?;
                Ok(fixed
                    .into_iter()
                    .zip(&keys)
                    .map(|(f, key)| f + self.blups.get(key).copied().unwrap_or(0.0))
                    .collect())
            }
        }
    }

    fn fixed_effects(&self) -> Coefficients {
        self.fixed.clone()
    }
}

impl MixedModel for RandomInterceptModel {
    type Refit = Self;

    fn refit_excluding(&self, data: &DataFrame, excluded: &[usize]) -> Result<Self> {
        Self::fit_named(
            &data.without_rows(excluded),
            self.response.clone(),
            self.predictors.clone(),
            self.cluster_variables.clone(),
            self.variance_ratio,
        )
    }

    fn variables(&self) -> Option<Vec<String>> {
        Some(
            std::iter::once(self.response.clone())
                .chain(self.predictors.iter().cloned())
                .chain(self.cluster_variables.iter().cloned())
                .collect(),
        )
    }
}
