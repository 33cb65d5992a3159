// ============================================================
// Layer 4 — Train/Eval Splitter
// ============================================================
// Randomly shuffles the formatted corpus and splits it into:
//   - Training set: used to update model weights
//   - Eval set:     used once per epoch to measure held-out loss
//
// Split ratio: 10% eval by default. The eval count is rounded UP,
// so any non-empty corpus of 10+ rows always yields an eval set
// (e.g. 25 rows → 3 eval, 22 train).
//
// The shuffle is seeded so the same corpus and seed always give
// the same split.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// The two disjoint halves of the corpus.
#[derive(Debug, Clone)]
pub struct SplitCorpus<T> {
    pub train: Vec<T>,
    pub eval:  Vec<T>,
}

/// Number of items that go to the eval side for a corpus of `total`.
pub fn eval_count(total: usize, eval_fraction: f64) -> usize {
    let raw = ((total as f64) * eval_fraction).ceil();
    (raw.max(0.0) as usize).min(total)
}

/// Shuffle `samples` with `seed` and split into (train, eval).
///
/// # Arguments
/// * `samples`       - All available samples (consumed by this function)
/// * `eval_fraction` - Proportion held out for evaluation, e.g. 0.1 = 10%
/// * `seed`          - Shuffle seed
pub fn split_train_eval<T>(mut samples: Vec<T>, eval_fraction: f64, seed: u64) -> SplitCorpus<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total   = samples.len();
    let n_eval  = eval_count(total, eval_fraction);

    // split_off(n) leaves [0..n) in place and returns [n..total)
    let eval = samples.split_off(total - n_eval);

    tracing::debug!(
        "Dataset split: {} training, {} eval ({}% / {}%)",
        samples.len(),
        eval.len(),
        (samples.len() * 100) / total.max(1),
        (eval.len()    * 100) / total.max(1),
    );

    SplitCorpus { train: samples, eval }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ten_percent_eval() {
        let items: Vec<usize> = (0..100).collect();
        let split = split_train_eval(items, 0.1, 42);
        assert_eq!(split.train.len(), 90);
        assert_eq!(split.eval.len(),  10);
    }

    #[test]
    fn test_eval_rounds_up() {
        assert_eq!(eval_count(25, 0.1), 3);
        assert_eq!(eval_count(1, 0.1), 1);
        assert_eq!(eval_count(0, 0.1), 0);
    }

    #[test]
    fn test_sizes_sum_and_disjoint() {
        for total in [0usize, 1, 7, 10, 33, 257] {
            let items: Vec<usize> = (0..total).collect();
            let split = split_train_eval(items, 0.1, 7);
            assert_eq!(split.train.len() + split.eval.len(), total);

            let train: HashSet<_> = split.train.iter().collect();
            assert!(split.eval.iter().all(|x| !train.contains(x)));
        }
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_eval((0..50).collect::<Vec<_>>(), 0.1, 42);
        let b = split_train_eval((0..50).collect::<Vec<_>>(), 0.1, 42);
        assert_eq!(a.eval, b.eval);
        assert_eq!(a.train, b.train);
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let split = split_train_eval((0..10).collect::<Vec<_>>(), 0.0, 1);
        assert_eq!(split.train.len(), 10);
        assert!(split.eval.is_empty());
    }
}
