//! Blocked cross-validation
//!
//! Rows are split into `n_splits + 1` equal contiguous blocks. Split `i`
//! trains on blocks `0..=i` and validates on block `i + 1`, so validation
//! always follows its training data and never overlaps it. Rows past the last
//! full block are never validated.

use std::ops::Range;

/// A contiguous train slice and the validation slice that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedSplit {
    /// Training rows
    pub train: Range<usize>,
    /// Validation rows, starting where `train` ends
    pub validation: Range<usize>,
}

/// Chronological train/validation slices over `n` ordered rows.
///
/// Yields exactly `n_splits` pairs. When `n < n_splits + 1` the blocks are
/// empty and callers must treat the data as insufficient.
pub fn blocked_cv_slices(n: usize, n_splits: usize) -> Vec<BlockedSplit> {
    let fold = n / (n_splits + 1);
    (0..n_splits)
        .map(|i| {
            let train_end = fold * (i + 1);
            let validation_end = fold * (i + 2);
            BlockedSplit {
                train: 0..train_end,
                validation: train_end..validation_end,
            }
        })
        .collect()
}

/// Smallest row count giving non-empty blocks for `n_splits`
pub const fn min_rows_for_splits(n_splits: usize) -> usize {
    n_splits + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, 3)]
    #[case(101, 3)]
    #[case(10, 1)]
    #[case(7, 6)]
    #[case(1000, 5)]
    fn test_slices_are_contiguous(#[case] n: usize, #[case] n_splits: usize) {
        let splits = blocked_cv_slices(n, n_splits);
        assert_eq!(splits.len(), n_splits);

        for split in &splits {
            assert_eq!(split.train.start, 0);
            assert_eq!(split.validation.start, split.train.end);
            assert!(split.validation.end <= n);
            assert!(!split.validation.is_empty());
        }
        for pair in splits.windows(2) {
            assert_eq!(pair[1].train.end, pair[0].validation.end);
        }
    }

    #[test]
    fn test_known_boundaries() {
        let splits = blocked_cv_slices(100, 3);
        assert_eq!(splits[0], BlockedSplit { train: 0..25, validation: 25..50 });
        assert_eq!(splits[1], BlockedSplit { train: 0..50, validation: 50..75 });
        assert_eq!(splits[2], BlockedSplit { train: 0..75, validation: 75..100 });
    }

    #[test]
    fn test_remainder_rows_unused() {
        let splits = blocked_cv_slices(11, 2);
        assert_eq!(splits.last().unwrap().validation, 6..9);
    }

    #[test]
    fn test_too_few_rows_gives_empty_blocks() {
        let splits = blocked_cv_slices(3, 3);
        assert_eq!(splits.len(), 3);
        assert!(splits.iter().all(|s| s.train.is_empty() && s.validation.is_empty()));
        assert_eq!(min_rows_for_splits(3), 4);
    }
}
