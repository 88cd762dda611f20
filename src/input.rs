//! Input sources for a recording session.

use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

use crate::{StepSortError, StepSortResult};

/// Exclusive upper bound for generated values.
pub const RANDOM_VALUE_BOUND: u64 = 20;

/// Parses a comma- or whitespace-separated list of integers.
pub fn parse_values(s: &str) -> StepSortResult<Vec<i64>> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<i64>()
                .map_err(|e| StepSortError::InvalidArgument(format!("invalid value {tok:?}: {e}")))
        })
        .collect()
}

/// `count` values in `0..RANDOM_VALUE_BOUND`, fully determined by `seed`.
pub fn random_values(count: usize, seed: u64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| (rng.next_u64() % RANDOM_VALUE_BOUND) as i64)
        .collect()
}
