use serde::{Deserialize, Serialize};

use crate::engine::range::Key;

pub type Digit = u8;

/// How a mismatched answer is diffed against the expected digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Walk the expected digits only. Missing input is incorrect, extra input
    /// is ignored, and the expected digit is what gets shown.
    #[default]
    CorrectLength,
    /// Walk the longer of both sides. Each position shows what was typed (or
    /// nothing) and extra input is incorrect.
    MaxLength,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredDigit {
    /// Digit to render at this position.
    pub shown: Option<Digit>,
    pub expected: Option<Digit>,
    pub actual: Option<Digit>,
    pub verdict: Verdict,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoredDigitSequence {
    pub digits: Vec<ScoredDigit>,
}

impl ScoredDigitSequence {
    pub fn correct_count(&self) -> usize {
        self.digits
            .iter()
            .filter(|d| d.verdict == Verdict::Correct)
            .count()
    }

    pub fn incorrect_count(&self) -> usize {
        self.digits.len() - self.correct_count()
    }

    pub fn accuracy(&self) -> f64 {
        if self.digits.is_empty() {
            return 100.0;
        }
        self.correct_count() as f64 / self.digits.len() as f64 * 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Score {
    ExactMatch,
    Scored(ScoredDigitSequence),
}

impl Score {
    pub fn is_exact(&self) -> bool {
        matches!(self, Score::ExactMatch)
    }
}

/// Keep only ASCII digits, in order.
pub fn normalize(raw: &str) -> Vec<Digit> {
    raw.bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect()
}

/// Digits of the keys concatenated in order.
pub fn forward_digits<'a>(keys: impl IntoIterator<Item = &'a Key>) -> Vec<Digit> {
    keys.into_iter()
        .flat_map(|k| normalize(k.as_str()))
        .collect()
}

/// Character-level reversal of the forward digits, so `["12", "7"]` gives
/// `7, 2, 1` rather than `7, 1, 2`.
pub fn backward_digits<'a>(keys: impl IntoIterator<Item = &'a Key>) -> Vec<Digit> {
    let mut digits = forward_digits(keys);
    digits.reverse();
    digits
}

pub fn score(input: &[Digit], correct: &[Digit], policy: ScoringPolicy) -> Score {
    if input == correct {
        return Score::ExactMatch;
    }

    let len = match policy {
        ScoringPolicy::CorrectLength => correct.len(),
        ScoringPolicy::MaxLength => input.len().max(correct.len()),
    };

    let digits = (0..len)
        .map(|i| {
            let expected = correct.get(i).copied();
            let actual = input.get(i).copied();
            let verdict = if expected.is_some() && expected == actual {
                Verdict::Correct
            } else {
                Verdict::Incorrect
            };
            let shown = match policy {
                ScoringPolicy::CorrectLength => expected,
                ScoringPolicy::MaxLength => actual,
            };
            ScoredDigit {
                shown,
                expected,
                actual,
                verdict,
            }
        })
        .collect();

    Score::Scored(ScoredDigitSequence { digits })
}

pub fn digits_to_string(digits: &[Digit]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}
