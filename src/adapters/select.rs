//! Choosing among candidate linear models by inner cross-validation.

use serde::{Deserialize, Serialize};

use super::LinearModel;
use crate::config::CvConfig;
use crate::cv::cv_cases;
use crate::data::DataFrame;
use crate::error::{CvError, Result};
use crate::traits::{Predictor, Selection, SelectionContext, SelectionProcedure};

/// A named set of predictors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identity reported when this candidate is selected
    pub name: String,
    /// Predictor columns
    pub predictors: Vec<String>,
}

impl Candidate {
    /// Create a candidate.
    #[must_use]
    pub fn new<S: AsRef<str>>(name: &str, predictors: &[S]) -> Self {
        Self {
            name: name.to_string(),
            predictors: predictors.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }
}

/// Selects the candidate with the smallest inner cross-validated criterion.
///
/// Inner folds use a fixed seed so the procedure is deterministic given its
/// training data. Ties go to the earlier candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelListSelection {
    response: String,
    candidates: Vec<Candidate>,
    inner_k: usize,
    inner_seed: u64,
}

impl ModelListSelection {
    /// Select among `candidates` for `response` with 5-fold inner CV.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an empty candidate list.
    pub fn new(response: &str, candidates: Vec<Candidate>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(CvError::InvalidRequest(
                "model selection needs at least one candidate".into(),
            ));
        }
        Ok(Self {
            response: response.to_string(),
            candidates,
            inner_k: 5,
            inner_seed: 1,
        })
    }

    /// Set the inner fold count.
    #[must_use]
    pub fn with_inner_k(mut self, k: usize) -> Self {
        self.inner_k = k;
        self
    }

    /// Set the inner fold seed.
    #[must_use]
    pub fn with_inner_seed(mut self, seed: u64) -> Self {
        self.inner_seed = seed;
        self
    }

    /// Candidates in evaluation order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    fn choose(&self, train: &DataFrame, ctx: &SelectionContext<'_>) -> Result<(usize, LinearModel)> {
        let inner = CvConfig::new()
            .with_k(self.inner_k)
            .with_seed(self.inner_seed)
            .with_details(false)
            .with_confint(false);

        let mut best: Option<(usize, f64, LinearModel)> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            let model = LinearModel::fit(train, &self.response, &candidate.predictors)?;
            let outcome = cv_cases(&model, train, ctx.criterion, &inner)?;
            let score = outcome
                .results()
                .first()
                .map_or(f64::INFINITY, |r| r.cv_criterion);
            tracing::trace!(candidate = %candidate.name, score, fold = ?ctx.fold, "inner cv");
            if best.as_ref().map_or(true, |(_, s, _)| score < *s) {
                best = Some((i, score, model));
            }
        }
        best.map(|(i, _, m)| (i, m))
            .ok_or_else(|| CvError::InvalidRequest("no candidate could be evaluated".into()))
    }
}

impl SelectionProcedure for ModelListSelection {
    fn select(
        &self,
        data: &DataFrame,
        held_out: Option<&[usize]>,
        ctx: &SelectionContext<'_>,
    ) -> Result<Selection> {
        let train = match held_out {
            Some(rows) => data.without_rows(rows),
            None => data.clone(),
        };
        let (index, model) = self.choose(&train, ctx)?;
        let all = model.predict(data)?;
        if all.len() != ctx.y.len() {
            return Err(CvError::dimension_mismatch(
                "selected-model predictions",
                ctx.y.len(),
                all.len(),
            ));
        }

        Ok(Selection {
            held_out_predictions: held_out
                .unwrap_or_default()
                .iter()
                .map(|&i| all[i])
                .collect(),
            criterion_all: ctx.criterion.evaluate(ctx.y, &all),
            coefficients: model.coefficients(),
            model_identity: Some(self.candidates[index].name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Criterion;

    fn data() -> DataFrame {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let noise: Vec<f64> = (0..30).map(|i| f64::from((i * 7) % 5) - 2.0).collect();
        let y = x.iter().zip(&noise).map(|(x, e)| 3.0 * x + e).collect();
        DataFrame::from_numeric(vec![("x", x), ("noise", noise.clone()), ("y", y)])
            .expect("valid")
    }

    fn procedure() -> ModelListSelection {
        ModelListSelection::new(
            "y",
            vec![
                Candidate::new::<&str>("null", &[]),
                Candidate::new("linear", &["x"]),
            ],
        )
        .expect("candidates")
    }

    #[test]
    fn test_selects_informative_candidate() {
        let data = data();
        let y = data.numeric("y").expect("y").to_vec();
        let criterion = Criterion::mse();
        let ctx = SelectionContext {
            y: &y,
            criterion: &criterion,
            fold: None,
        };
        let s = procedure().select(&data, None, &ctx).expect("selects");
        assert_eq!(s.model_identity.as_deref(), Some("linear"));
        assert!(s.held_out_predictions.is_empty());
        assert!(s.criterion_all < 3.0);
    }

    #[test]
    fn test_held_out_predictions_sized() {
        let data = data();
        let y = data.numeric("y").expect("y").to_vec();
        let criterion = Criterion::mse();
        let ctx = SelectionContext {
            y: &y,
            criterion: &criterion,
            fold: Some(0),
        };
        let s = procedure()
            .select(&data, Some(&[0, 5, 9]), &ctx)
            .expect("selects");
        assert_eq!(s.held_out_predictions.len(), 3);
    }

    #[test]
    fn test_empty_candidates_rejected() {
        assert!(ModelListSelection::new("y", vec![]).is_err());
    }
}
