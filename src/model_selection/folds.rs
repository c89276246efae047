//! Fold partitioner.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{CvError, Result};

/// Requested number of folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Folds {
    /// `k` folds, `2 <= k <= n`.
    Count(usize),
    /// One fold per unit (`k = n`).
    LeaveOneOut,
}

impl Folds {
    /// Resolve to a concrete fold count for `n` units.
    #[must_use]
    pub fn resolve(self, n: usize) -> usize {
        match self {
            Self::Count(k) => k,
            Self::LeaveOneOut => n,
        }
    }
}

impl From<usize> for Folds {
    fn from(k: usize) -> Self {
        Self::Count(k)
    }
}

/// Assignment of `n` units to `k` folds.
///
/// Fold `j` holds `permutation[starts[j]..ends[j]]`. The first `n mod k`
/// folds hold one extra unit. The plan is immutable once built.
///
/// # Example
///
/// ```rust
/// use crossfold::model_selection::{build_folds, fold_members, Folds};
///
/// let plan = build_folds(22, Folds::Count(5), Some(123)).expect("valid k");
/// assert_eq!(plan.sizes(), &[5, 5, 4, 4, 4]);
/// assert_eq!(fold_members(&plan, 0).len(), 5);
/// assert_eq!(plan.seed(), Some(123));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldPlan {
    n: usize,
    k: usize,
    sizes: Vec<usize>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    permutation: Vec<usize>,
    seed: Option<u64>,
}

impl FoldPlan {
    /// Leave-one-out plan: fold `i` is unit `i`, no randomness consumed.
    fn leave_one_out(n: usize) -> Self {
        Self::from_permutation((0..n).collect(), n, None)
    }

    /// Build a shuffled plan drawing the permutation from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFoldSpec` unless `2 <= k <= n`.
    pub fn with_rng<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Result<Self> {
        validate_k(n, k)?;
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        Ok(Self::from_permutation(indices, k, None))
    }

    fn from_permutation(permutation: Vec<usize>, k: usize, seed: Option<u64>) -> Self {
        let n = permutation.len();
        let fold_size = n / k;
        let remainder = n % k;

        let mut sizes = Vec::with_capacity(k);
        let mut starts = Vec::with_capacity(k);
        let mut ends = Vec::with_capacity(k);
        let mut start = 0;

        for i in 0..k {
            // Distribute remainder across first folds
            let size = if i < remainder {
                fold_size + 1
            } else {
                fold_size
            };
            sizes.push(size);
            starts.push(start);
            ends.push(start + size);
            start += size;
        }

        Self {
            n,
            k,
            sizes,
            starts,
            ends,
            permutation,
            seed,
        }
    }

    /// Number of units partitioned.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of folds.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Fold sizes, larger folds first.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Start offset of each fold in the permutation.
    #[must_use]
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// End offset (exclusive) of each fold in the permutation.
    #[must_use]
    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// Unit order after shuffling.
    #[must_use]
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Seed that produced the permutation; `None` for leave-one-out.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// True when every fold holds exactly one unit.
    #[must_use]
    pub fn is_leave_one_out(&self) -> bool {
        self.k == self.n
    }

    /// Fold index of every unit.
    #[must_use]
    pub fn assignment(&self) -> Vec<usize> {
        let mut fold_of = vec![0; self.n];
        for j in 0..self.k {
            for &unit in fold_members(self, j) {
                fold_of[unit] = j;
            }
        }
        fold_of
    }
}

/// Members of fold `j` (0-based) as a slice of the permutation.
///
/// # Panics
///
/// Panics if `j >= plan.k()`.
#[must_use]
pub fn fold_members(plan: &FoldPlan, j: usize) -> &[usize] {
    &plan.permutation[plan.starts[j]..plan.ends[j]]
}

/// Partition `n` units into folds.
///
/// Leave-one-out (`k == n`) uses the identity order and must not be given a
/// seed. Otherwise the order is shuffled with `StdRng` seeded by `seed`, or by
/// a freshly drawn seed that is recorded in the plan.
///
/// # Errors
///
/// - `InvalidFoldSpec` unless `2 <= k <= n`
/// - `InvalidRequest` if a seed is supplied for leave-one-out
pub fn build_folds(n: usize, k: Folds, seed: Option<u64>) -> Result<FoldPlan> {
    let k = k.resolve(n);
    validate_k(n, k)?;

    if k == n {
        if seed.is_some() {
            return Err(CvError::InvalidRequest(
                "a seed has no effect for leave-one-out folds".into(),
            ));
        }
        return Ok(FoldPlan::leave_one_out(n));
    }

    let seed = match seed {
        Some(s) => s,
        None => {
            let drawn = draw_seed();
            tracing::info!(seed = drawn, "drew random seed for fold permutation");
            drawn
        }
    };
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut plan = FoldPlan::with_rng(n, k, &mut rng)?;
    plan.seed = Some(seed);
    Ok(plan)
}

/// Draw a fresh seed in `1..=1_000_000` from the thread RNG.
#[must_use]
pub fn draw_seed() -> u64 {
    rand::thread_rng().gen_range(1..=1_000_000)
}

fn validate_k(n: usize, k: usize) -> Result<()> {
    if k < 2 {
        return Err(CvError::InvalidFoldSpec {
            k,
            n,
            reason: "k must be at least 2".into(),
        });
    }
    if k > n {
        return Err(CvError::InvalidFoldSpec {
            k,
            n,
            reason: "k must not exceed the number of units".into(),
        });
    }
    Ok(())
}
