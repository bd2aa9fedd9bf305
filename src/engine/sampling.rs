use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::range::{Key, Pool};
use crate::error::{Result, TrainerError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Every draw is uniform over the whole pool.
    #[default]
    WithReplacement,
    /// No key repeats until the pool is exhausted, then the pool refills.
    WithoutReplacement,
}

impl SamplingPolicy {
    pub fn from_no_repeats(no_repeats: bool) -> Self {
        if no_repeats {
            SamplingPolicy::WithoutReplacement
        } else {
            SamplingPolicy::WithReplacement
        }
    }

    pub fn no_repeats(self) -> bool {
        matches!(self, SamplingPolicy::WithoutReplacement)
    }
}

/// Working copy of a pool for without-replacement draws.
#[derive(Clone, Debug, Default)]
pub struct RefPool {
    remaining: Vec<Key>,
}

impl RefPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn clear(&mut self) {
        self.remaining.clear();
    }
}

/// Draw one key from `pool`. Under `WithoutReplacement`, `state` is refilled
/// from `pool` whenever it runs dry, so a full pass returns every key once.
pub fn draw<R: Rng + ?Sized>(
    pool: &Pool,
    policy: SamplingPolicy,
    state: &mut RefPool,
    rng: &mut R,
) -> Result<Key> {
    if pool.is_empty() {
        return Err(TrainerError::EmptyPool);
    }

    match policy {
        SamplingPolicy::WithReplacement => {
            let idx = rng.gen_range(0..pool.len());
            Ok(pool.keys()[idx].clone())
        }
        SamplingPolicy::WithoutReplacement => {
            if state.remaining.is_empty() {
                state.remaining.extend_from_slice(pool.keys());
            }
            let idx = rng.gen_range(0..state.remaining.len());
            Ok(state.remaining.swap_remove(idx))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::range::expand;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    #[test]
    fn test_without_replacement_full_pass_returns_each_key_once() {
        let pool = expand("ALL").unwrap();
        let mut state = RefPool::new();
        let mut rng = SmallRng::seed_from_u64(7);

        let drawn: Vec<Key> = (0..pool.len())
            .map(|_| draw(&pool, SamplingPolicy::WithoutReplacement, &mut state, &mut rng).unwrap())
            .collect();

        let unique: HashSet<&Key> = drawn.iter().collect();
        assert_eq!(unique.len(), pool.len());
        assert!(state.is_empty());
    }

    #[test]
    fn test_without_replacement_refills_after_exhaustion() {
        let pool = expand("10-19").unwrap();
        let mut state = RefPool::new();
        let mut rng = SmallRng::seed_from_u64(11);

        for pass in 0..3 {
            let mut seen = HashSet::new();
            for _ in 0..pool.len() {
                let key =
                    draw(&pool, SamplingPolicy::WithoutReplacement, &mut state, &mut rng).unwrap();
                assert!(seen.insert(key), "repeat within pass {pass}");
            }
            assert_eq!(seen.len(), 10);
        }
    }

    #[test]
    fn test_with_replacement_reaches_every_key() {
        let pool = expand("0-9").unwrap();
        let mut state = RefPool::new();
        let mut rng = SmallRng::seed_from_u64(3);

        let seen: HashSet<Key> = (0..1000)
            .map(|_| draw(&pool, SamplingPolicy::WithReplacement, &mut state, &mut rng).unwrap())
            .collect();
        assert_eq!(seen.len(), 10);
        // with replacement never touches the working copy
        assert!(state.is_empty());
    }

    #[test]
    fn test_empty_pool_is_an_error_for_both_policies() {
        let pool = Pool::from(Vec::new());
        let mut state = RefPool::new();
        let mut rng = SmallRng::seed_from_u64(0);
        for policy in [SamplingPolicy::WithReplacement, SamplingPolicy::WithoutReplacement] {
            assert_eq!(
                draw(&pool, policy, &mut state, &mut rng),
                Err(TrainerError::EmptyPool)
            );
        }
    }

    #[test]
    fn test_policy_from_no_repeats() {
        assert_eq!(
            SamplingPolicy::from_no_repeats(true),
            SamplingPolicy::WithoutReplacement
        );
        assert!(!SamplingPolicy::from_no_repeats(false).no_repeats());
    }
}
