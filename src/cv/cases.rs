//! Case-level cross-validation.

use super::{assemble, case_tasks, expect_len, run_diagnostics, FoldOutcome, RunContext};
use crate::config::{CvConfig, DEFAULT_K};
use crate::criterion::Criterion;
use crate::data::DataFrame;
use crate::error::Result;
use crate::executor::{Dispatcher, Execution};
use crate::model_selection::{build_folds, Folds};
use crate::replicate::replicate;
use crate::result::CvOutcome;
use crate::traits::CvModel;

/// Cross-validate a model refit by removing cases.
///
/// Each fold's cases are held out, the model is refit on the rest and
/// predicts the held-out cases. The assembled out-of-fold predictions give
/// `cv_criterion`; the full-data fit gives `full_data_criterion`. Default
/// `k` is 10.
///
/// # Errors
///
/// - `InvalidFoldSpec` / `InvalidRequest` from option validation
/// - `NonNumericResponse` / `NonVectorResponse` from response extraction
/// - any adapter failure during a fold, which aborts the run
///
/// # Example
///
/// ```rust
/// use crossfold::adapters::LinearModel;
/// use crossfold::config::CvConfig;
/// use crossfold::criterion::Criterion;
/// use crossfold::cv::cv_cases;
/// use crossfold::data::DataFrame;
///
/// let x: Vec<f64> = (0..40).map(f64::from).collect();
/// let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0 + (v * 0.7).sin()).collect();
/// let data = DataFrame::from_numeric(vec![("x", x), ("y", y)]).expect("valid frame");
///
/// let model = LinearModel::fit(&data, "y", &["x"]).expect("fits");
/// let out = cv_cases(&model, &data, &Criterion::mse(), &CvConfig::new().with_k(5).with_seed(7))
///     .expect("cross-validates");
/// let result = out.as_single().expect("one replicate");
/// assert!(result.adjusted_cv_criterion.is_some());
/// ```
pub fn cv_cases<M: CvModel>(
    model: &M,
    data: &DataFrame,
    criterion: &Criterion,
    config: &CvConfig,
) -> Result<CvOutcome> {
    let n = data.n_rows();
    let resolved = config.resolve(n, n, Folds::Count(DEFAULT_K))?;
    let dispatcher = Dispatcher::new(Execution::from_ncores(resolved.ncores)?)?;

    let y = model.response(data)?.into_numeric()?;
    expect_len("response", n, y.len())?;

    let full = model.predict(data)?;
    expect_len("full-data predictions", n, full.len())?;

    let ctx = RunContext {
        criterion,
        y: &y,
        resolved: &resolved,
        full_data_criterion: criterion.evaluate(&y, &full),
        coefficients: model.coefficients(),
        selected_model: None,
        cluster_info: None,
        diagnostics: run_diagnostics(&resolved, model.variables(), data),
    };

    replicate(resolved.reps, resolved.k == n, resolved.seed, |seed| {
        let plan = build_folds(n, resolved.folds, seed)?;
        let tasks = case_tasks(&plan);
        let outcomes = dispatcher.dispatch(&tasks, |task| {
            let fit = model.refit_and_predict(data, &task.held_out)?;
            FoldOutcome::from_fit(fit, task, &y, criterion)
        })?;
        assemble(&ctx, plan.seed(), &tasks, outcomes)
    })
}
