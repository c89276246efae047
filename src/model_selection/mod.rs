//! Partitioning of cases and clusters into cross-validation folds.
//!
//! This module provides:
//! - [`FoldPlan`]: near-equal random folds over `n` units
//! - [`ClusterPlan`]: folds over distinct combinations of grouping variables
//! - Seed resolution for reproducible permutations

mod clusters;
mod folds;

pub use clusters::{ClusterPlan, Clusters};
pub use folds::{build_folds, draw_seed, fold_members, FoldPlan, Folds};

#[cfg(test)]
#[path = "tests_folds_contract.rs"]
mod tests_folds_contract;
