//! Cluster plan: folds over distinct combinations of grouping variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::folds::{build_folds, fold_members, FoldPlan, Folds};
use crate::data::{cluster_label, ClusterKey, DataFrame};
use crate::error::Result;

/// Distinct combinations of grouping-variable values and their cases.
///
/// Clusters are ordered by key, comparing values variable by variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clusters {
    variables: Vec<String>,
    keys: Vec<ClusterKey>,
    members: Vec<Vec<usize>>,
}

impl Clusters {
    /// Group the rows of `data` by `variables`.
    ///
    /// # Errors
    ///
    /// Returns an error if `variables` is empty or names a missing column.
    pub fn from_data(data: &DataFrame, variables: &[String]) -> Result<Self> {
        let keys = data.cluster_keys(variables)?;

        let mut groups: BTreeMap<ClusterKey, Vec<usize>> = BTreeMap::new();
        for (case, key) in keys.into_iter().enumerate() {
            groups.entry(key).or_default().push(case);
        }
        let (keys, members) = groups.into_iter().unzip();

        Ok(Self {
            variables: variables.to_vec(),
            keys,
            members,
        })
    }

    /// Names of the grouping variables.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of distinct clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.keys.len()
    }

    /// Grouping values of each cluster.
    #[must_use]
    pub fn keys(&self) -> &[ClusterKey] {
        &self.keys
    }

    /// Display label of each cluster, values joined with `.`.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.keys.iter().map(|k| cluster_label(k)).collect()
    }

    /// Cases belonging to cluster `c`.
    #[must_use]
    pub fn cluster_cases(&self, c: usize) -> &[usize] {
        &self.members[c]
    }
}

/// Folds whose units are clusters rather than cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPlan {
    clusters: Clusters,
    folds: FoldPlan,
}

impl ClusterPlan {
    /// Partition already-grouped clusters into folds.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`build_folds`].
    pub fn new(clusters: Clusters, k: Folds, seed: Option<u64>) -> Result<Self> {
        let folds = build_folds(clusters.n_clusters(), k, seed)?;
        Ok(Self { clusters, folds })
    }

    /// Group the rows of `data` by `variables` and partition the clusters.
    ///
    /// # Errors
    ///
    /// Propagates missing-column errors and the errors of [`build_folds`].
    pub fn build(
        data: &DataFrame,
        variables: &[String],
        k: Folds,
        seed: Option<u64>,
    ) -> Result<Self> {
        Self::new(Clusters::from_data(data, variables)?, k, seed)
    }

    /// The grouped clusters.
    #[must_use]
    pub fn clusters(&self) -> &Clusters {
        &self.clusters
    }

    /// Number of distinct clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.clusters.n_clusters()
    }

    /// Underlying fold plan over cluster indices.
    #[must_use]
    pub fn folds(&self) -> &FoldPlan {
        &self.folds
    }

    /// Clusters held out in fold `j`.
    #[must_use]
    pub fn clusters_in_fold(&self, j: usize) -> &[usize] {
        fold_members(&self.folds, j)
    }

    /// Cases held out in fold `j`, in ascending order.
    #[must_use]
    pub fn cases_in_fold(&self, j: usize) -> Vec<usize> {
        let mut cases: Vec<usize> = self
            .clusters_in_fold(j)
            .iter()
            .flat_map(|&c| self.clusters.cluster_cases(c).iter().copied())
            .collect();
        cases.sort_unstable();
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn grouped(n_groups: usize, per_group: usize) -> DataFrame {
        let n = n_groups * per_group;
        DataFrame::new(vec![
            (
                "g".to_string(),
                Column::Categorical((0..n).map(|i| format!("g{:03}", i / per_group)).collect()),
            ),
            ("x".to_string(), Column::Numeric((0..n).map(|i| i as f64).collect())),
        ])
        .expect("valid frame")
    }

    #[test]
    fn test_cluster_counts() {
        let df = grouped(160, 3);
        let plan = ClusterPlan::build(&df, &["g".to_string()], Folds::Count(10), Some(7))
            .expect("valid plan");
        assert_eq!(plan.n_clusters(), 160);
        for j in 0..10 {
            assert_eq!(plan.clusters_in_fold(j).len(), 16);
            assert_eq!(plan.cases_in_fold(j).len(), 48);
        }
    }

    #[test]
    fn test_cases_cover_all_rows_once() {
        let df = grouped(11, 4);
        let plan = ClusterPlan::build(&df, &["g".to_string()], Folds::Count(3), Some(1))
            .expect("valid plan");
        let mut all: Vec<usize> = (0..3).flat_map(|j| plan.cases_in_fold(j)).collect();
        all.sort_unstable();
        assert_eq!(all, (0..44).collect::<Vec<_>>());
    }

    #[test]
    fn test_whole_clusters_held_out_together() {
        let df = grouped(6, 5);
        let plan = ClusterPlan::build(&df, &["g".to_string()], Folds::LeaveOneOut, None)
            .expect("valid plan");
        assert_eq!(plan.folds().k(), 6);
        for j in 0..6 {
            let cases = plan.cases_in_fold(j);
            assert_eq!(cases.len(), 5);
            assert!(cases.iter().all(|&c| c / 5 == cases[0] / 5));
        }
    }

    #[test]
    fn test_clusters_sorted_by_key() {
        let df = DataFrame::new(vec![(
            "g".to_string(),
            Column::Categorical(vec!["b".into(), "a".into(), "b".into()]),
        )])
        .expect("valid frame");
        let clusters = Clusters::from_data(&df, &["g".to_string()]).expect("grouped");
        assert_eq!(clusters.labels(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(clusters.cluster_cases(1), &[0, 2]);
        assert_eq!(clusters.variables(), &["g".to_string()]);
    }

    #[test]
    fn test_missing_variable_fails() {
        let df = grouped(4, 2);
        assert!(ClusterPlan::build(&df, &["nope".to_string()], Folds::Count(2), None).is_err());
    }

    #[test]
    fn test_combinations_with_dots_stay_distinct() {
        let df = DataFrame::new(vec![
            (
                "a".to_string(),
                Column::Categorical(vec!["x.y".into(), "x".into(), "x.y".into()]),
            ),
            (
                "b".to_string(),
                Column::Categorical(vec!["z".into(), "y.z".into(), "z".into()]),
            ),
        ])
        .expect("valid frame");
        let clusters =
            Clusters::from_data(&df, &["a".to_string(), "b".to_string()]).expect("grouped");
        assert_eq!(clusters.n_clusters(), 2);
        assert_eq!(clusters.keys()[0], vec!["x", "y.z"]);
        assert_eq!(clusters.cluster_cases(1), &[0, 2]);
    }

    #[test]
    fn test_numeric_combinations_stay_distinct() {
        let df = DataFrame::from_numeric(vec![
            ("u", vec![1.5, 1.0, 1.5, 1.0]),
            ("v", vec![2.0, 5.2, 2.0, 5.2]),
        ])
        .expect("valid frame");
        let vars = ["u".to_string(), "v".to_string()];
        let plan = ClusterPlan::build(&df, &vars, Folds::LeaveOneOut, None).expect("valid plan");
        assert_eq!(plan.n_clusters(), 2);
        assert_eq!(plan.folds().k(), 2);
        for j in 0..2 {
            let cases = plan.cases_in_fold(j);
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[1] - cases[0], 2);
        }
    }
}
