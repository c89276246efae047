//! Cross-validation of a model-selection procedure ("meta" cross-validation).
//!
//! The unit refit per fold is the whole procedure, so the error estimate
//! accounts for the variability of the selection itself.

use super::{assemble, case_tasks, expect_len, run_diagnostics, FoldOutcome, RunContext};
use crate::config::{CvConfig, DEFAULT_K};
use crate::criterion::Criterion;
use crate::data::DataFrame;
use crate::error::{CvError, Result};
use crate::executor::{Dispatcher, Execution};
use crate::model_selection::{build_folds, Folds};
use crate::replicate::replicate;
use crate::result::CvOutcome;
use crate::traits::{ResponseExpr, ResponseProvider, SelectionContext, SelectionProcedure};

/// Cross-validate a selection procedure.
///
/// The response comes from exactly one of `model` (a fitted model) or
/// `response` (an expression evaluated against `data`). The procedure is
/// run once per fold with that fold's cases held out, and once on the full
/// data to obtain the baseline selection and `full_data_criterion`.
///
/// # Errors
///
/// - `MissingResponse` if neither `model` nor `response` is given
/// - `InvalidRequest` if both are given, or from option validation
/// - `InvalidFoldSpec` for a bad `k`
/// - procedure failures, which abort the run
pub fn cv_select<P: SelectionProcedure + ?Sized>(
    procedure: &P,
    data: &DataFrame,
    criterion: &Criterion,
    config: &CvConfig,
    model: Option<&dyn ResponseProvider>,
    response: Option<&ResponseExpr>,
) -> Result<CvOutcome> {
    let n = data.n_rows();
    let resolved = config.resolve(n, n, Folds::Count(DEFAULT_K))?;
    let dispatcher = Dispatcher::new(Execution::from_ncores(resolved.ncores)?)?;

    let y = match (model, response) {
        (Some(_), Some(_)) => {
            return Err(CvError::InvalidRequest(
                "supply either a model or a response expression, not both".into(),
            ))
        }
        (None, None) => return Err(CvError::MissingResponse),
        (Some(m), None) => m.response(data)?,
        (None, Some(expr)) => expr.evaluate(data)?,
    }
    .into_numeric()?;
    expect_len("response", n, y.len())?;

    let baseline = procedure
        .select(
            data,
            None,
            &SelectionContext {
                y: &y,
                criterion,
                fold: None,
            },
        )
        .map_err(|e| e.in_context("full-data selection"))?;
    tracing::debug!(
        selected = baseline.model_identity.as_deref().unwrap_or("<unnamed>"),
        criterion = baseline.criterion_all,
        "full-data selection"
    );

    let ctx = RunContext {
        criterion,
        y: &y,
        resolved: &resolved,
        full_data_criterion: baseline.criterion_all,
        coefficients: baseline.coefficients,
        selected_model: baseline.model_identity,
        cluster_info: None,
        diagnostics: run_diagnostics(&resolved, None, data),
    };

    replicate(resolved.reps, resolved.k == n, resolved.seed, |seed| {
        let plan = build_folds(n, resolved.folds, seed)?;
        let tasks = case_tasks(&plan);
        let outcomes = dispatcher.dispatch(&tasks, |task| {
            let selection = procedure.select(
                data,
                Some(&task.held_out),
                &SelectionContext {
                    y: &y,
                    criterion,
                    fold: Some(task.fold),
                },
            )?;
            FoldOutcome::new(
                selection.held_out_predictions,
                selection.criterion_all,
                selection.coefficients,
                selection.model_identity,
                task,
            )
        })?;
        assemble(&ctx, plan.seed(), &tasks, outcomes)
    })
}
