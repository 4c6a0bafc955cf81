//! Train/validation partition by choice set.
use crate::choice::{
    core::{data::ChoiceData, options::SplitOptions},
    errors::{ChoiceError, ChoiceResult},
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::HashSet;
use tracing::info;

/// Split whole choice sets into `(train, validation)`.
///
/// Set ids are shuffled with `StdRng::seed_from_u64(opts.seed)`; the first
/// `round(fraction · n)` ids go to validation, capped so that at least one
/// set stays in training. Both halves keep ascending id order. A fraction of
/// zero returns an empty validation half.
///
/// # Errors
/// `EmptyTrainingSplit` if `data` holds no choice sets.
pub fn train_validation_split(
    data: ChoiceData, opts: &SplitOptions,
) -> ChoiceResult<(ChoiceData, ChoiceData)> {
    let n = data.len();
    if n == 0 {
        return Err(ChoiceError::EmptyTrainingSplit);
    }
    let n_valid = ((opts.validation_fraction * n as f64).round() as usize).min(n - 1);

    let mut ids: Vec<usize> = data.sets().iter().map(|s| s.id).collect();
    let mut rng = StdRng::seed_from_u64(opts.seed);
    ids.shuffle(&mut rng);
    let valid_ids: HashSet<usize> = ids.into_iter().take(n_valid).collect();

    let n_alternatives = data.n_alternatives();
    let (valid, train): (Vec<_>, Vec<_>) =
        data.into_sets().into_iter().partition(|s| valid_ids.contains(&s.id));
    info!(train = train.len(), validation = valid.len(), seed = opts.seed, "split choice sets");
    Ok((
        ChoiceData::from_validated_sets(train, n_alternatives),
        ChoiceData::from_validated_sets(valid, n_alternatives),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::core::{data::tests::set_rows, options::ReshapeOptions};

    fn sets(n: usize) -> ChoiceData {
        let rows = (0..n).flat_map(|id| set_rows(id, 1, &[1.0, 2.0])).collect();
        ChoiceData::from_long_rows(rows, &ReshapeOptions::new(2).unwrap()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The split is a seeded partition of whole choice sets.
    //
    // Given
    // -----
    // - 10 sets, fraction 0.2, seed 42, split twice.
    //
    // Expect
    // ------
    // - 8 train / 2 validation, disjoint, covering all ids, identical on the
    //   second run, each half in ascending id order.
    fn split_is_seeded_disjoint_and_complete() {
        let opts = SplitOptions::new(0.2, 42).unwrap();

        let (train, valid) = train_validation_split(sets(10), &opts).unwrap();
        let (train2, valid2) = train_validation_split(sets(10), &opts).unwrap();

        assert_eq!(train.len(), 8);
        assert_eq!(valid.len(), 2);
        let t: Vec<usize> = train.sets().iter().map(|s| s.id).collect();
        let v: Vec<usize> = valid.sets().iter().map(|s| s.id).collect();
        assert!(t.iter().all(|id| !v.contains(id)));
        let mut all: Vec<usize> = t.iter().chain(&v).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert!(t.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(train, train2);
        assert_eq!(valid, valid2);
    }

    #[test]
    // Purpose
    // -------
    // Training keeps at least one set, and fraction zero disables validation.
    //
    // Given
    // -----
    // - 2 sets with fraction 0.9; 3 sets with fraction 0.
    //
    // Expect
    // ------
    // - `(1, 1)` and `(3, 0)`.
    fn split_keeps_one_training_set_and_honours_zero_fraction() {
        let (train, valid) =
            train_validation_split(sets(2), &SplitOptions::new(0.9, 1).unwrap()).unwrap();
        assert_eq!((train.len(), valid.len()), (1, 1));

        let (train, valid) =
            train_validation_split(sets(3), &SplitOptions::new(0.0, 1).unwrap()).unwrap();
        assert_eq!((train.len(), valid.len()), (3, 0));
    }
}
