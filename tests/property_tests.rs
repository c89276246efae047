//! Property-based tests using proptest.
//!
//! These tests check partition and aggregation invariants over random inputs.

use crossfold::model_selection::{build_folds, fold_members, Folds};
use crossfold::prelude::*;
use crossfold::replicate::summarize;
use proptest::prelude::*;

// Strategy for (n, k) with 2 <= k <= n
fn n_and_k() -> impl Strategy<Value = (usize, usize)> {
    (2usize..200).prop_flat_map(|n| (Just(n), 2usize..=n))
}

fn line_frame(noise: &[f64]) -> DataFrame {
    let x: Vec<f64> = (0..noise.len()).map(|i| i as f64).collect();
    let y = x.iter().zip(noise).map(|(x, e)| 0.3 * x + e).collect();
    DataFrame::from_numeric(vec![("x", x), ("y", y)]).expect("valid frame")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn folds_partition_every_unit_once((n, k) in n_and_k(), seed in 1u64..1_000_000) {
        let plan = build_folds(n, Folds::Count(k), if k == n { None } else { Some(seed) })
            .expect("valid k");
        let mut seen = vec![0usize; n];
        for j in 0..k {
            for &i in fold_members(&plan, j) {
                seen[i] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn fold_sizes_differ_by_at_most_one((n, k) in n_and_k()) {
        let seed = if k == n { None } else { Some(42) };
        let plan = build_folds(n, Folds::Count(k), seed).expect("valid k");
        let max = plan.sizes().iter().copied().max().unwrap_or(0);
        let min = plan.sizes().iter().copied().min().unwrap_or(0);
        prop_assert!(max - min <= 1);
        prop_assert_eq!(plan.sizes().iter().sum::<usize>(), n);
    }

    #[test]
    fn same_seed_same_permutation((n, k) in n_and_k(), seed in 1u64..1_000_000) {
        prop_assume!(k < n);
        let a = build_folds(n, Folds::Count(k), Some(seed)).expect("valid k");
        let b = build_folds(n, Folds::Count(k), Some(seed)).expect("valid k");
        prop_assert_eq!(a.permutation(), b.permutation());
    }

    #[test]
    fn summary_range_contains_mean(values in proptest::collection::vec(0.0f64..100.0, 2..10)) {
        let results: Vec<CvResult> = values
            .iter()
            .map(|&v| CvResult {
                cv_criterion: v,
                adjusted_cv_criterion: None,
                full_data_criterion: v,
                confidence_interval: None,
                standard_error: None,
                k: 5,
                seed: Some(1),
                criterion_name: "mse".into(),
                coefficients: None,
                details: None,
                cluster_info: None,
                selected_model: None,
                diagnostics: vec![],
            })
            .collect();
        let s = summarize(&results);
        prop_assert!(s.cv_criterion.min <= s.cv_criterion.mean + 1e-9);
        prop_assert!(s.cv_criterion.mean <= s.cv_criterion.max + 1e-9);
        prop_assert!(s.cv_criterion.sd >= 0.0);
        prop_assert!(s.adjusted_cv_criterion.is_none());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn mse_cv_is_finite_and_adjusted(
        noise in proptest::collection::vec(-1.0f64..1.0, 20..60),
        k in 2usize..8,
        seed in 1u64..1000,
    ) {
        let data = line_frame(&noise);
        let model = LinearModel::fit(&data, "y", &["x"]).expect("fits");
        let config = CvConfig::new().with_k(k).with_seed(seed);
        let outcome = cv_cases(&model, &data, &Criterion::mse(), &config).expect("runs");
        let result = outcome.as_single().expect("single");
        prop_assert!(result.cv_criterion.is_finite());
        prop_assert!(result.cv_criterion >= 0.0);
        prop_assert!(result.adjusted_cv_criterion.expect("casewise").is_finite());
        prop_assert_eq!(result.k, k);
    }
}
