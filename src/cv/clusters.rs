//! Clustered cross-validation for mixed-effects models.
//!
//! With cluster variables, whole clusters are held out and predicted from
//! fixed effects only, since random effects of unseen clusters are
//! undefined. Without them, single cases are held out and predicted from
//! fixed effects plus BLUPs of their clusters' random effects.

use serde::{Deserialize, Serialize};

use super::{assemble, case_tasks, expect_len, run_diagnostics, FoldOutcome, RunContext};
use crate::config::{CvConfig, DEFAULT_K};
use crate::criterion::Criterion;
use crate::data::DataFrame;
use crate::error::Result;
use crate::executor::{Dispatcher, Execution, FoldTask};
use crate::model_selection::{build_folds, ClusterPlan, Clusters, Folds};
use crate::replicate::replicate;
use crate::result::{ClusterInfo, ClusterMode, CvOutcome};
use crate::traits::{MixedModel, MixedPredictor, PredictionMode};

/// Which units clustered cross-validation holds out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Variables whose value combinations define clusters. `None` holds out
    /// individual cases instead.
    pub cluster_variables: Option<Vec<String>>,
}

impl ClusterSpec {
    /// Hold out whole clusters defined by `variables`.
    #[must_use]
    pub fn clusters<S: AsRef<str>>(variables: &[S]) -> Self {
        Self {
            cluster_variables: Some(variables.iter().map(|v| v.as_ref().to_string()).collect()),
        }
    }

    /// Hold out individual cases.
    #[must_use]
    pub fn cases() -> Self {
        Self::default()
    }

    fn mode(&self) -> ClusterMode {
        match self.cluster_variables {
            Some(_) => ClusterMode::Clusters,
            None => ClusterMode::Cases,
        }
    }
}

/// Cross-validate a mixed-effects model.
///
/// Default `k` is leave-one-cluster-out in cluster mode and 10 in case mode.
///
/// # Errors
///
/// - `InvalidFoldSpec` / `InvalidRequest` from option validation
/// - `ColumnNotFound` for an unknown cluster variable
/// - response extraction and adapter failures
pub fn cv_clusters<M: MixedModel>(
    model: &M,
    data: &DataFrame,
    criterion: &Criterion,
    config: &CvConfig,
    spec: &ClusterSpec,
) -> Result<CvOutcome> {
    let n = data.n_rows();
    let mode = spec.mode();

    let clusters = match &spec.cluster_variables {
        Some(vars) => Some(Clusters::from_data(data, vars)?),
        None => None,
    };
    let resolved = match &clusters {
        Some(c) => config.resolve(c.n_clusters(), n, Folds::LeaveOneOut)?,
        None => config.resolve(n, n, Folds::Count(DEFAULT_K))?,
    };
    let dispatcher = Dispatcher::new(Execution::from_ncores(resolved.ncores)?)?;

    let prediction = match mode {
        ClusterMode::Clusters => PredictionMode::FixedOnly,
        ClusterMode::Cases => PredictionMode::FixedAndRandom,
    };

    let y = model.response(data)?.into_numeric()?;
    expect_len("response", n, y.len())?;

    let full = model.predict(data, prediction)?;
    expect_len("full-data predictions", n, full.len())?;

    let cluster_info = ClusterInfo {
        mode,
        cluster_variables: spec.cluster_variables.clone().unwrap_or_default(),
        n_clusters: clusters.as_ref().map(Clusters::n_clusters),
    };
    tracing::debug!(?mode, ?prediction, k = resolved.k, "clustered cross-validation");

    let ctx = RunContext {
        criterion,
        y: &y,
        resolved: &resolved,
        full_data_criterion: criterion.evaluate(&y, &full),
        coefficients: Some(model.fixed_effects()),
        selected_model: None,
        cluster_info: Some(cluster_info),
        diagnostics: run_diagnostics(&resolved, model.variables(), data),
    };

    let units = clusters.as_ref().map_or(n, Clusters::n_clusters);
    replicate(resolved.reps, resolved.k == units, resolved.seed, |seed| {
        let (tasks, used_seed) = match &clusters {
            Some(c) => {
                let plan = ClusterPlan::new(c.clone(), resolved.folds, seed)?;
                (cluster_tasks(&plan), plan.folds().seed())
            }
            None => {
                let plan = build_folds(n, resolved.folds, seed)?;
                (case_tasks(&plan), plan.seed())
            }
        };

        let outcomes = dispatcher.dispatch(&tasks, |task| {
            let refit = model.refit_excluding(data, &task.held_out)?;
            let all = refit.predict(data, prediction)?;
            expect_len("refit predictions", n, all.len())?;
            let held_out = task.held_out.iter().map(|&i| all[i]).collect();
            FoldOutcome::new(
                held_out,
                criterion.evaluate(&y, &all),
                Some(refit.fixed_effects()),
                None,
                task,
            )
        })?;

        assemble(&ctx, used_seed, &tasks, outcomes)
    })
}

fn cluster_tasks(plan: &ClusterPlan) -> Vec<FoldTask> {
    (0..plan.folds().k())
        .map(|fold| FoldTask {
            fold,
            held_out: plan.cases_in_fold(fold),
        })
        .collect()
}
