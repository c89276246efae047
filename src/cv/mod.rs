//! Cross-validation orchestrators.
//!
//! - [`cv_cases`]: refit by removing cases (independent observations)
//! - [`cv_clusters`]: mixed models, removing whole clusters or single cases
//! - [`cv_select`]: re-run an entire model-selection procedure per fold
//! - [`cv_models`]: several competing models over identical folds
//!
//! Every orchestrator validates its options, fits nothing itself, hands the
//! per-fold work to the [`crate::executor`], and assembles the fold outcomes
//! in fold order into a [`CvResult`].

mod cases;
mod clusters;
mod compare;
mod select;

pub use cases::cv_cases;
pub use clusters::{cv_clusters, ClusterSpec};
pub use compare::{cv_models, ModelComparison};
pub use select::cv_select;

use crate::config::Resolved;
use crate::criterion::Criterion;
use crate::data::DataFrame;
use crate::error::{CvError, Result};
use crate::estimate::{bias_adjust, BiasInputs};
use crate::executor::{parallel_available, FoldTask};
use crate::model_selection::{fold_members, FoldPlan};
use crate::result::{ClusterInfo, Coefficients, CvResult, Diagnostic, FoldDetails, FoldFit};

/// What survives of one fold once its refit has been evaluated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FoldOutcome {
    held_out: Vec<f64>,
    crit_all: f64,
    coefficients: Option<Coefficients>,
    model_identity: Option<String>,
}

impl FoldOutcome {
    /// Evaluate a refit's full-data predictions and keep only what
    /// aggregation needs.
    fn from_fit(fit: FoldFit, task: &FoldTask, y: &[f64], criterion: &Criterion) -> Result<Self> {
        if fit.all.len() != y.len() {
            return Err(CvError::dimension_mismatch(
                "full-data predictions",
                y.len(),
                fit.all.len(),
            ));
        }
        Self::new(
            fit.held_out,
            criterion.evaluate(y, &fit.all),
            fit.coefficients,
            fit.model_identity,
            task,
        )
    }

    fn new(
        held_out: Vec<f64>,
        crit_all: f64,
        coefficients: Option<Coefficients>,
        model_identity: Option<String>,
        task: &FoldTask,
    ) -> Result<Self> {
        if held_out.len() != task.held_out.len() {
            return Err(CvError::dimension_mismatch(
                "held-out predictions",
                task.held_out.len(),
                held_out.len(),
            ));
        }
        Ok(Self {
            held_out,
            crit_all,
            coefficients,
            model_identity,
        })
    }
}

/// Run-level pieces that do not depend on the folds.
#[derive(Debug, Clone)]
pub(crate) struct RunContext<'a> {
    criterion: &'a Criterion,
    y: &'a [f64],
    resolved: &'a Resolved,
    full_data_criterion: f64,
    coefficients: Option<Coefficients>,
    selected_model: Option<String>,
    cluster_info: Option<ClusterInfo>,
    diagnostics: Vec<Diagnostic>,
}

/// One fold task per fold of `plan`, held-out cases ascending.
pub(crate) fn case_tasks(plan: &FoldPlan) -> Vec<FoldTask> {
    (0..plan.k())
        .map(|fold| {
            let mut held_out = fold_members(plan, fold).to_vec();
            held_out.sort_unstable();
            FoldTask { fold, held_out }
        })
        .collect()
}

/// Diagnostics every orchestrator starts from.
pub(crate) fn run_diagnostics(
    resolved: &Resolved,
    variables: Option<Vec<String>>,
    data: &DataFrame,
) -> Vec<Diagnostic> {
    let mut diagnostics = resolved.diagnostics.clone();
    if let Some(d) = check_variables(variables, data) {
        diagnostics.push(d);
    }
    if resolved.ncores > 1 && !parallel_available() {
        diagnostics.push(Diagnostic::SequentialFallback {
            requested: resolved.ncores,
        });
    }
    diagnostics
}

/// Report model variables that are absent from the data. Never fatal.
pub(crate) fn check_variables(
    variables: Option<Vec<String>>,
    data: &DataFrame,
) -> Option<Diagnostic> {
    let missing: Vec<String> = variables?
        .into_iter()
        .filter(|v| !data.has_column(v))
        .collect();
    if missing.is_empty() {
        return None;
    }
    tracing::warn!(missing = ?missing, "model variables missing from data");
    Some(Diagnostic::FormulaMismatch { missing })
}

/// Check a response/prediction vector covers every case.
pub(crate) fn expect_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CvError::dimension_mismatch(what, expected, actual))
    }
}

/// Combine fold outcomes, in fold order, into a result.
pub(crate) fn assemble(
    ctx: &RunContext<'_>,
    seed: Option<u64>,
    tasks: &[FoldTask],
    outcomes: Vec<FoldOutcome>,
) -> Result<CvResult> {
    let n = ctx.y.len();
    let mut yhat = vec![f64::NAN; n];
    let mut crit_all = Vec::with_capacity(tasks.len());
    let mut fold_sizes = Vec::with_capacity(tasks.len());
    let mut details = ctx.resolved.details.then(FoldDetails::default);

    for (task, outcome) in tasks.iter().zip(outcomes) {
        for (&case, &pred) in task.held_out.iter().zip(&outcome.held_out) {
            yhat[case] = pred;
        }
        crit_all.push(outcome.crit_all);
        fold_sizes.push(task.held_out.len());

        if let Some(d) = details.as_mut() {
            let y_fold: Vec<f64> = task.held_out.iter().map(|&i| ctx.y[i]).collect();
            d.per_fold_criterion
                .push(ctx.criterion.evaluate(&y_fold, &outcome.held_out));
            d.per_fold_coefficients.push(outcome.coefficients);
            d.per_fold_model_identity.push(outcome.model_identity);
        }
    }

    let cv_criterion = ctx.criterion.evaluate(ctx.y, &yhat);
    let adjustment = bias_adjust(
        ctx.criterion,
        &BiasInputs {
            y: ctx.y,
            yhat: &yhat,
            cv_criterion,
            full_data_criterion: ctx.full_data_criterion,
            crit_all: &crit_all,
            fold_sizes: &fold_sizes,
        },
        ctx.resolved.confint,
        ctx.resolved.level,
    )?;

    let mut diagnostics = ctx.diagnostics.clone();
    if adjustment.is_none() {
        tracing::warn!(
            criterion = ctx.criterion.name(),
            "criterion has no casewise loss; bias adjustment omitted"
        );
        diagnostics.push(Diagnostic::NoCasewiseLoss {
            criterion: ctx.criterion.name().to_string(),
        });
    }

    tracing::debug!(
        criterion = ctx.criterion.name(),
        cv_criterion,
        k = tasks.len(),
        "cross-validation assembled"
    );

    Ok(CvResult {
        cv_criterion,
        adjusted_cv_criterion: adjustment.map(|a| a.adjusted),
        full_data_criterion: ctx.full_data_criterion,
        confidence_interval: adjustment.and_then(|a| a.confidence_interval),
        standard_error: adjustment.map(|a| a.standard_error),
        k: tasks.len(),
        seed,
        criterion_name: ctx.criterion.name().to_string(),
        coefficients: ctx.coefficients.clone(),
        details,
        cluster_info: ctx.cluster_info.clone(),
        selected_model: ctx.selected_model.clone(),
        diagnostics,
    })
}
