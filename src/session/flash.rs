use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::engine::range::{Key, RangeSpec};
use crate::engine::sampling::{self, RefPool, SamplingPolicy};
use crate::error::Result;
use crate::words::WordLookup;

/// What the flash drill shows after a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashFrame {
    pub key: Key,
    pub word: String,
}

/// Continuous single-number drill. Holds its own no-repeat state, which is
/// thrown away whenever the selected range changes.
pub struct FlashSession {
    ref_pool: RefPool,
    last_range: Option<RangeSpec>,
    current: Option<FlashFrame>,
    rng: SmallRng,
}

impl FlashSession {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            ref_pool: RefPool::new(),
            last_range: None,
            current: None,
            rng,
        }
    }

    pub fn tick(&mut self, range: &RangeSpec, policy: SamplingPolicy) -> Result<Key> {
        if self.last_range != Some(*range) {
            self.ref_pool.clear();
            self.last_range = Some(*range);
        }
        let pool = range.expand();
        sampling::draw(&pool, policy, &mut self.ref_pool, &mut self.rng)
    }

    /// Tick and pair the drawn key with its word.
    pub fn tick_with_words(
        &mut self,
        range: &RangeSpec,
        policy: SamplingPolicy,
        words: &impl WordLookup,
    ) -> Result<&FlashFrame> {
        let key = self.tick(range, policy)?;
        let word = words.word(&key).to_string();
        Ok(self.current.insert(FlashFrame { key, word }))
    }

    pub fn current(&self) -> Option<&FlashFrame> {
        self.current.as_ref()
    }

    /// Blank the display. Sampling state is kept for the next run.
    pub fn stop(&mut self) {
        self.current = None;
    }
}

impl Default for FlashSession {
    fn default() -> Self {
        Self::new()
    }
}
