//! Execution dispatcher for per-fold work.
//!
//! Folds run either sequentially or on a rayon pool that a [`Dispatcher`]
//! builds once per orchestrator call and drops when the call returns, on
//! success or error. Results come back in fold
//! order in both modes, so aggregation downstream is identical.

#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CvError, Result};

/// Context handed to each fold's work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldTask {
    /// 0-based fold index
    pub fold: usize,
    /// Cases held out in this fold, ascending
    pub held_out: Vec<usize>,
}

/// How folds are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// One fold after another on the calling thread.
    Sequential,
    /// On a pool with this many workers.
    Parallel(usize),
}

impl Execution {
    /// Choose a mode from a worker count; `1` means sequential.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for zero workers.
    pub fn from_ncores(ncores: usize) -> Result<Self> {
        match ncores {
            0 => Err(CvError::InvalidRequest("ncores must be at least 1".into())),
            1 => Ok(Self::Sequential),
            n if parallel_available() => Ok(Self::Parallel(n)),
            n => {
                tracing::warn!(
                    requested = n,
                    "parallel execution not compiled in; running folds sequentially"
                );
                Ok(Self::Sequential)
            }
        }
    }
}

/// True when the crate was built with the `parallel` feature.
#[must_use]
pub fn parallel_available() -> bool {
    cfg!(feature = "parallel")
}

/// Fold runner for one orchestrator call.
///
/// In parallel mode it owns the worker pool, built once in [`Dispatcher::new`]
/// and shared by every replicate of the call. Dropping the dispatcher tears
/// the pool down.
#[derive(Debug)]
pub struct Dispatcher {
    execution: Execution,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Dispatcher {
    /// Acquire the resources `execution` needs.
    ///
    /// # Errors
    ///
    /// Returns `WorkerPool` if the pool cannot be built.
    pub fn new(execution: Execution) -> Result<Self> {
        #[cfg(feature = "parallel")]
        let pool = match execution {
            Execution::Sequential => None,
            Execution::Parallel(ncores) => Some(build_pool(ncores)?),
        };
        Ok(Self {
            execution,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Mode this dispatcher runs in.
    #[must_use]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Run `work` once per task and collect results in task order.
    ///
    /// The first error aborts the run; no partial results are returned.
    ///
    /// # Errors
    ///
    /// Propagates the first failing task's error.
    pub fn dispatch<T, F>(&self, tasks: &[FoldTask], work: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&FoldTask) -> Result<T> + Send + Sync,
    {
        self.run(tasks, &work)
    }

    #[cfg(feature = "parallel")]
    fn run<T, F>(&self, tasks: &[FoldTask], work: &F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&FoldTask) -> Result<T> + Send + Sync,
    {
        match &self.pool {
            Some(pool) => {
                tracing::debug!(
                    workers = pool.current_num_threads(),
                    folds = tasks.len(),
                    "dispatching folds to pool"
                );
                pool.install(|| tasks.par_iter().map(|t| run_task(t, work)).collect())
            }
            None => tasks.iter().map(|t| run_task(t, work)).collect(),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run<T, F>(&self, tasks: &[FoldTask], work: &F) -> Result<Vec<T>>
    where
        F: Fn(&FoldTask) -> Result<T>,
    {
        tasks.iter().map(|t| run_task(t, work)).collect()
    }
}

/// One-shot form of [`Dispatcher::dispatch`]: acquires and releases the
/// resources for a single batch of tasks.
///
/// # Errors
///
/// Propagates the first failing task's error, or `WorkerPool` if the pool
/// cannot be built.
pub fn dispatch<T, F>(tasks: &[FoldTask], execution: Execution, work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&FoldTask) -> Result<T> + Send + Sync,
{
    Dispatcher::new(execution)?.dispatch(tasks, work)
}

#[cfg(feature = "parallel")]
fn build_pool(ncores: usize) -> Result<rayon::ThreadPool> {
    static POOLS: AtomicUsize = AtomicUsize::new(0);
    let id = POOLS.fetch_add(1, Ordering::Relaxed);
    rayon::ThreadPoolBuilder::new()
        .num_threads(ncores)
        .thread_name(move |i| format!("crossfold-{id}-{i}"))
        .build()
        .map_err(|e| CvError::WorkerPool(e.to_string()))
}

fn run_task<T, F>(task: &FoldTask, work: &F) -> Result<T>
where
    F: Fn(&FoldTask) -> Result<T>,
{
    tracing::debug!(fold = task.fold + 1, held_out = task.held_out.len(), "fold started");
    let out = work(task).map_err(|e| e.in_context(&format!("fold {}", task.fold + 1)))?;
    tracing::debug!(fold = task.fold + 1, "fold finished");
    Ok(out)
}
