// =========================================================================
// FALSIFY-FP: fold partitioner contract
//
// References:
//   - Stone (1974) "Cross-Validatory Choice and Assessment of Predictions"
// =========================================================================

use super::*;
use crate::error::CvError;

/// FALSIFY-FP-001: exactly k folds whose sizes sum to n
#[test]
fn falsify_fp_001_k_folds_sum_to_n() {
    let plan = build_folds(100, Folds::Count(7), Some(11)).expect("valid k");

    assert_eq!(plan.k(), 7, "FALSIFIED FP-001: k={}, expected 7", plan.k());
    assert_eq!(
        plan.sizes().iter().sum::<usize>(),
        100,
        "FALSIFIED FP-001: sizes sum to {}",
        plan.sizes().iter().sum::<usize>()
    );
}

/// FALSIFY-FP-002: every unit appears in exactly one fold
#[test]
fn falsify_fp_002_every_unit_in_one_fold() {
    let plan = build_folds(20, Folds::Count(6), Some(5)).expect("valid k");

    let mut counts = vec![0usize; 20];
    for j in 0..plan.k() {
        for &i in fold_members(&plan, j) {
            counts[i] += 1;
        }
    }
    for (i, &count) in counts.iter().enumerate() {
        assert_eq!(
            count, 1,
            "FALSIFIED FP-002: unit {i} appeared in {count} folds (expected 1)"
        );
    }
}

/// FALSIFY-FP-003: larger folds come first and differ by one
#[test]
fn falsify_fp_003_remainder_goes_first() {
    let plan = build_folds(17, Folds::Count(4), Some(2)).expect("valid k");
    assert_eq!(
        plan.sizes(),
        &[5, 4, 4, 4],
        "FALSIFIED FP-003: sizes={:?}",
        plan.sizes()
    );
}

/// FALSIFY-FP-004: leave-one-out consumes no randomness
#[test]
fn falsify_fp_004_loo_identity() {
    let a = build_folds(9, Folds::LeaveOneOut, None).expect("valid");
    let b = build_folds(9, Folds::LeaveOneOut, None).expect("valid");
    assert_eq!(a, b, "FALSIFIED FP-004: leave-one-out plans differ");
    assert_eq!(a.permutation(), &(0..9).collect::<Vec<_>>()[..]);
    assert!(a.seed().is_none());
}

/// FALSIFY-FP-005: out-of-range k is rejected before any work
#[test]
fn falsify_fp_005_bad_k_rejected() {
    for k in [0, 1, 31] {
        let result = build_folds(30, Folds::Count(k), None);
        assert!(
            matches!(result, Err(CvError::InvalidFoldSpec { .. })),
            "FALSIFIED FP-005: k={k} accepted"
        );
    }
}

mod fp_proptest_falsify {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// FALSIFY-FP-001-prop: disjoint cover with balanced sizes
        #[test]
        fn falsify_fp_001_prop_balanced_cover(
            n in 2..=200usize,
            k in 2..=25usize,
            seed in 1..=1_000_000u64,
        ) {
            let k = k.min(n);
            let seed = if k == n { None } else { Some(seed) };
            let plan = build_folds(n, Folds::Count(k), seed).expect("valid k");

            let min = *plan.sizes().iter().min().expect("k >= 2");
            let max = *plan.sizes().iter().max().expect("k >= 2");
            prop_assert!(max - min <= 1, "FALSIFIED FP-001-prop: sizes {:?}", plan.sizes());
            prop_assert_eq!(plan.sizes().iter().filter(|&&s| s == n / k + 1).count(), n % k);

            let mut seen = vec![false; n];
            for j in 0..plan.k() {
                for &i in fold_members(&plan, j) {
                    prop_assert!(!seen[i], "FALSIFIED FP-001-prop: unit {} repeated", i);
                    seen[i] = true;
                }
            }
            prop_assert!(seen.into_iter().all(|s| s));
        }

        /// FALSIFY-FP-006-prop: same seed, same plan
        #[test]
        fn falsify_fp_006_prop_seed_determinism(
            n in 3..=120usize,
            seed in 1..=1_000_000u64,
        ) {
            let k = 2.max(n / 3);
            prop_assume!(k < n);
            let a = build_folds(n, Folds::Count(k), Some(seed)).expect("valid");
            let b = build_folds(n, Folds::Count(k), Some(seed)).expect("valid");
            prop_assert_eq!(a, b);
        }
    }
}
