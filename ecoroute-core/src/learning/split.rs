//! Row index splits for hold-out and cross validation

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::Error;

/// Shuffled hold-out split, returns `(train, test)` row indices.
/// The test side gets `ceil(n * test_fraction)` rows but never all of them.
///
/// # Errors
///
/// Returns an error for fewer than two rows or a fraction outside `(0, 1)`.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), Error> {
    if n < 2 {
        return Err(Error::EmptyDataset("at least two rows are needed to split"));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::ConfigError(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Contiguous, unshuffled folds. The first `n % k` folds get one extra row.
///
/// # Errors
///
/// Returns an error unless `2 <= k <= n`.
pub fn k_fold(n: usize, k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, Error> {
    if k < 2 || k > n {
        return Err(Error::ConfigError(format!(
            "cannot split {n} rows into {k} folds"
        )));
    }

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = n / k + usize::from(fold < n % k);
        let end = start + size;
        let test: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, test));
        start = end;
    }
    Ok(folds)
}
