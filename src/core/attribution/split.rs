use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{error, info};

use crate::core::error::{DatasetError, DatasetResult};

/// Number of rows that go to the test partition: `ceil(fraction * total)`.
pub fn test_count(total: usize, test_fraction: f64) -> usize {
    ((total as f64) * test_fraction).ceil().min(total as f64) as usize
}

/// Shuffle `rows` with a generator seeded by `seed` and split them into
/// `(train, test)`.
///
/// The first `test_count` rows of the permutation form the test partition.
/// The same rows, fraction and seed always give the same partitions.
pub fn train_test_split<T>(
    rows: Vec<T>,
    test_fraction: f64,
    seed: u64,
) -> DatasetResult<(Vec<T>, Vec<T>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        error!("Invalid test fraction {}: must lie strictly between 0 and 1", test_fraction);
        return Err(DatasetError::InvalidTestFraction(test_fraction));
    }

    let total = rows.len();
    let n_test = test_count(total, test_fraction);

    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    let mut take = |idx: &usize| slots[*idx].take();

    let test: Vec<T> = order[..n_test].iter().filter_map(&mut take).collect();
    let train: Vec<T> = order[n_test..].iter().filter_map(&mut take).collect();

    info!(
        "Split {} rows into {} train / {} test (fraction={}, seed={})",
        total,
        train.len(),
        test.len(),
        test_fraction,
        seed
    );

    Ok((train, test))
}
