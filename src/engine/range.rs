use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TrainerError};

/// A number slot such as `"7"` or `"07"`. Padding is part of the identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn padded(n: u32, two_digit: bool) -> Self {
        if two_digit {
            Self(format!("{n:02}"))
        } else {
            Self(n.to_string())
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Largest number a key can name.
pub const MAX_NUMBER: u32 = 99;

/// A selectable number range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeSpec {
    /// Every number 0..=99, two-digit padded.
    All,
    Span { start: u32, end: u32, two_digit: bool },
}

impl RangeSpec {
    pub const fn span(start: u32, end: u32, two_digit: bool) -> Self {
        RangeSpec::Span {
            start,
            end,
            two_digit,
        }
    }

    /// Expand into the concrete key pool, in ascending order.
    pub fn expand(&self) -> Pool {
        let keys = match *self {
            RangeSpec::All => (0..=MAX_NUMBER).map(|n| Key::padded(n, true)).collect(),
            RangeSpec::Span {
                start,
                end,
                two_digit,
            } => (start..=end).map(|n| Key::padded(n, two_digit)).collect(),
        };
        Pool { keys }
    }

    pub fn len(&self) -> usize {
        match *self {
            RangeSpec::All => 100,
            RangeSpec::Span { start, end, .. } => end.saturating_sub(start) as usize + 1,
        }
    }

    /// Parsed ranges always hold at least one key.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::All
    }
}

impl FromStr for RangeSpec {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("ALL") {
            return Ok(RangeSpec::All);
        }
        let invalid = || TrainerError::InvalidRange(s.to_string());

        let (start_raw, end_raw) = s.split_once('-').ok_or_else(invalid)?;
        let is_literal = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !is_literal(start_raw) || !is_literal(end_raw) {
            return Err(invalid());
        }
        if start_raw.len() > 2 || end_raw.len() > 2 {
            return Err(invalid());
        }
        let start: u32 = start_raw.parse().map_err(|_| invalid())?;
        let end: u32 = end_raw.parse().map_err(|_| invalid())?;
        if start > end || end > MAX_NUMBER {
            return Err(invalid());
        }
        Ok(RangeSpec::Span {
            start,
            end,
            two_digit: start_raw.len() > 1,
        })
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RangeSpec::All => f.write_str("ALL"),
            RangeSpec::Span {
                start,
                end,
                two_digit: true,
            } => write!(f, "{start:02}-{end:02}"),
            RangeSpec::Span { start, end, .. } => write!(f, "{start}-{end}"),
        }
    }
}

impl Serialize for RangeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RangeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse and expand a range spec string in one step.
pub fn expand(spec: &str) -> Result<Pool> {
    Ok(spec.parse::<RangeSpec>()?.expand())
}

/// The fixed catalog: optional "ALL", then "0-9", "00-09", "10-19" .. "90-99".
pub fn catalog(include_all: bool) -> Vec<RangeSpec> {
    let mut ranges = Vec::with_capacity(12);
    if include_all {
        ranges.push(RangeSpec::All);
    }
    ranges.push(RangeSpec::span(0, 9, false));
    ranges.push(RangeSpec::span(0, 9, true));
    for tens in 1..=9 {
        ranges.push(RangeSpec::span(tens * 10, tens * 10 + 9, true));
    }
    ranges
}

/// Step through the catalog, wrapping at both ends. A range not in the
/// catalog steps to its first entry.
pub fn cycle(current: RangeSpec, include_all: bool, forward: bool) -> RangeSpec {
    let ranges = catalog(include_all);
    let count = ranges.len();
    match ranges.iter().position(|r| *r == current) {
        Some(idx) if forward => ranges[(idx + 1) % count],
        Some(idx) => ranges[(idx + count - 1) % count],
        None => ranges[0],
    }
}

/// Immutable ordered key pool produced by expanding a range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    keys: Vec<Key>,
}

impl Pool {
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }
}

impl From<Vec<Key>> for Pool {
    fn from(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ranges_follow_padding_and_size() {
        for range in catalog(false) {
            let pool = range.expand();
            let RangeSpec::Span {
                start,
                end,
                two_digit,
            } = range
            else {
                panic!("ALL should not be in the catalog without include_all");
            };
            assert_eq!(pool.len(), (end - start) as usize + 1, "range {range}");
            for key in pool.iter() {
                let n: u32 = key.as_str().parse().unwrap();
                assert!((start..=end).contains(&n), "{key} outside {range}");
                if two_digit {
                    assert_eq!(key.as_str().len(), 2, "{key} in {range}");
                } else {
                    assert_eq!(key.as_str(), n.to_string());
                }
            }
        }
    }

    #[test]
    fn test_all_has_one_hundred_unique_padded_keys() {
        let pool = expand("ALL").unwrap();
        assert_eq!(pool.len(), 100);
        let unique: HashSet<&Key> = pool.iter().collect();
        assert_eq!(unique.len(), 100);
        assert_eq!(pool.keys()[0].as_str(), "00");
        assert_eq!(pool.keys()[99].as_str(), "99");
        assert!(pool.iter().all(|k| k.as_str().len() == 2));
    }

    #[test]
    fn test_single_digit_range_is_unpadded() {
        let pool = expand("0-9").unwrap();
        let keys: Vec<&str> = pool.iter().map(Key::as_str).collect();
        assert_eq!(keys, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
    }

    #[test]
    fn test_padded_low_range() {
        let pool = expand("00-09").unwrap();
        assert_eq!(pool.keys()[0].as_str(), "00");
        assert_eq!(pool.keys()[9].as_str(), "09");
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        for bad in [
            "", "abc", "5", "9-1", "a-b", "1-", "-3", "1-2-3", "1 - 2", "0-150", "00-100", "000-09",
            "0-4000000000",
        ] {
            assert!(
                matches!(bad.parse::<RangeSpec>(), Err(TrainerError::InvalidRange(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parsed_ranges_stay_within_two_digits() {
        for spec in ["0-99", "00-99", "5-5", "90-99"] {
            let range: RangeSpec = spec.parse().unwrap();
            assert!(!range.is_empty());
            let pool = range.expand();
            assert_eq!(pool.len(), range.len());
            assert!(pool.iter().all(|k| k.as_str().len() <= 2), "{spec}");
        }
    }

    #[test]
    fn test_catalog_membership_of_all_is_configurable() {
        assert_eq!(catalog(true).len(), 12);
        assert_eq!(catalog(true)[0], RangeSpec::All);
        assert_eq!(catalog(false).len(), 11);
        assert!(!catalog(false).contains(&RangeSpec::All));
    }

    #[test]
    fn test_display_parses_back() {
        for range in catalog(true) {
            assert_eq!(range.to_string().parse::<RangeSpec>().unwrap(), range);
        }
        assert_eq!(RangeSpec::span(10, 19, true).to_string(), "10-19");
        assert_eq!(RangeSpec::span(0, 9, true).to_string(), "00-09");
    }

    #[test]
    fn test_cycle_wraps() {
        let first = catalog(true)[0];
        let last = *catalog(true).last().unwrap();
        assert_eq!(cycle(last, true, true), first);
        assert_eq!(cycle(first, true, false), last);
        // ALL is not reachable when excluded
        assert_eq!(cycle(RangeSpec::All, false, true), RangeSpec::span(0, 9, false));
    }
}
