use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::engine::range::{Key, RangeSpec};
use crate::engine::sampling::{self, RefPool, SamplingPolicy};
use crate::engine::scoring::{self, Digit, Score, ScoringPolicy};
use crate::error::{Result, TrainerError};

/// One trial's presented keys, in presentation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    keys: Vec<Key>,
}

impl Sequence {
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn forward_digits(&self) -> Vec<Digit> {
        scoring::forward_digits(&self.keys)
    }

    pub fn backward_digits(&self) -> Vec<Digit> {
        scoring::backward_digits(&self.keys)
    }
}

impl From<Vec<Key>> for Sequence {
    fn from(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

/// Append-only log of the sequences shown this session.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<Sequence>,
}

impl History {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Sequence] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys of the last `count` entries, oldest first.
    pub fn recent_keys(&self, count: usize) -> Vec<&Key> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries[skip..]
            .iter()
            .flat_map(|seq| seq.keys.iter())
            .collect()
    }

    fn push(&mut self, sequence: Sequence) {
        self.entries.push(sequence);
    }
}

/// Which recollection is being checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckKind {
    Forward,
    Backward,
    /// The last `n` sequences of the history, concatenated.
    PartialForward(usize),
    PartialBackward(usize),
}

impl CheckKind {
    pub fn label(self) -> &'static str {
        match self {
            CheckKind::Forward => "Forward",
            CheckKind::Backward => "Backward",
            CheckKind::PartialForward(_) => "Partial forward",
            CheckKind::PartialBackward(_) => "Partial backward",
        }
    }
}

/// A scored recollection, kept for display until the next trial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub score: Score,
}

pub struct SequenceSession {
    ref_pool: RefPool,
    history: History,
    last: Option<Sequence>,
    rng: SmallRng,
}

impl SequenceSession {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            ref_pool: RefPool::new(),
            history: History::default(),
            last: None,
            rng,
        }
    }

    /// Draw a fresh sequence of at least one key and log it to the history.
    /// No-repeat state never carries over from the previous trial.
    pub fn start(
        &mut self,
        range: &RangeSpec,
        count: usize,
        policy: SamplingPolicy,
    ) -> Result<Sequence> {
        let pool = range.expand();
        if pool.is_empty() {
            return Err(TrainerError::EmptyPool);
        }
        let count = count.max(1);

        self.ref_pool.clear();
        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            keys.push(sampling::draw(
                &pool,
                policy,
                &mut self.ref_pool,
                &mut self.rng,
            )?);
        }

        let sequence = Sequence { keys };
        self.history.push(sequence.clone());
        self.last = Some(sequence.clone());
        Ok(sequence)
    }

    pub fn last(&self) -> Option<&Sequence> {
        self.last.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Empties the history. The last sequence stays checkable.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Expected digits for a check, or `None` when there is nothing to check
    /// against yet.
    pub fn target(&self, kind: CheckKind) -> Option<Vec<Digit>> {
        match kind {
            CheckKind::Forward => self.last.as_ref().map(Sequence::forward_digits),
            CheckKind::Backward => self.last.as_ref().map(Sequence::backward_digits),
            CheckKind::PartialForward(n) | CheckKind::PartialBackward(n) => {
                if self.history.is_empty() {
                    return None;
                }
                let keys = self.history.recent_keys(n.max(1));
                Some(if matches!(kind, CheckKind::PartialForward(_)) {
                    scoring::forward_digits(keys)
                } else {
                    scoring::backward_digits(keys)
                })
            }
        }
    }

    pub fn check(&self, kind: CheckKind, raw: &str, policy: ScoringPolicy) -> Option<Score> {
        let correct = self.target(kind)?;
        Some(scoring::score(&scoring::normalize(raw), &correct, policy))
    }
}

impl Default for SequenceSession {
    fn default() -> Self {
        Self::new()
    }
}
