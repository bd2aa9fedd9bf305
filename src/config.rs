use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::range::RangeSpec;
use crate::engine::sampling::SamplingPolicy;
use crate::engine::scoring::ScoringPolicy;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_include_all_range")]
    pub include_all_range: bool,
    #[serde(default = "default_scoring_policy")]
    pub scoring_policy: ScoringPolicy,
    #[serde(default = "default_voice")]
    pub voice: bool,
    #[serde(default)]
    pub speech_command: Option<String>,
    #[serde(default)]
    pub words_path: Option<String>,
    #[serde(default = "default_export_path")]
    pub export_path: String,
    #[serde(default = "default_sequence")]
    pub sequence: SequenceConfig,
    #[serde(default = "default_flash")]
    pub flash: FlashConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_range")]
    pub range: RangeSpec,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub no_repeats: bool,
    /// Seconds between consecutive numbers.
    #[serde(default = "default_pause_secs")]
    pub pause_secs: f64,
    /// Seconds each number stays visible.
    #[serde(default = "default_flash_secs")]
    pub flash_secs: f64,
    #[serde(default)]
    pub manual_start: bool,
    #[serde(default = "default_partial_count")]
    pub partial_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlashConfig {
    #[serde(default = "default_range")]
    pub range: RangeSpec,
    #[serde(default)]
    pub no_repeats: bool,
    #[serde(default = "default_flash_speed_ms")]
    pub speed_ms: u64,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_include_all_range() -> bool {
    true
}
fn default_scoring_policy() -> ScoringPolicy {
    ScoringPolicy::CorrectLength
}
fn default_voice() -> bool {
    false
}
fn default_export_path() -> String {
    "numbers_export.json".to_string()
}
fn default_range() -> RangeSpec {
    RangeSpec::All
}
fn default_count() -> usize {
    5
}
fn default_pause_secs() -> f64 {
    3.0
}
fn default_flash_secs() -> f64 {
    1.0
}
fn default_partial_count() -> usize {
    1
}
fn default_flash_speed_ms() -> u64 {
    2000
}
fn default_sequence() -> SequenceConfig {
    SequenceConfig::default()
}
fn default_flash() -> FlashConfig {
    FlashConfig::default()
}

pub const MIN_FLASH_SPEED_MS: u64 = 250;
pub const MAX_FLASH_SPEED_MS: u64 = 60_000;
/// Upper bound for the pause and flash durations of a sequence.
pub const MAX_DELAY_SECS: f64 = 60.0;
pub const MAX_SEQUENCE_COUNT: usize = 1000;

/// Negative or non-finite values fall back to `default`; the rest are capped
/// at `MAX_DELAY_SECS`.
fn clamp_secs(secs: f64, default: f64) -> f64 {
    if secs.is_finite() && secs >= 0.0 {
        secs.min(MAX_DELAY_SECS)
    } else {
        default
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            include_all_range: default_include_all_range(),
            scoring_policy: default_scoring_policy(),
            voice: default_voice(),
            speech_command: None,
            words_path: None,
            export_path: default_export_path(),
            sequence: default_sequence(),
            flash: default_flash(),
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
            count: default_count(),
            no_repeats: false,
            pause_secs: default_pause_secs(),
            flash_secs: default_flash_secs(),
            manual_start: false,
            partial_count: default_partial_count(),
        }
    }
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
            no_repeats: false,
            speed_ms: default_flash_speed_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("majordrill")
            .join("config.toml")
    }

    /// Clamp values a hand-edited file may have left out of range.
    pub fn normalize(&mut self) {
        self.sequence.count = self.sequence.count.clamp(1, MAX_SEQUENCE_COUNT);
        self.sequence.partial_count = self.sequence.partial_count.clamp(1, MAX_SEQUENCE_COUNT);
        self.sequence.pause_secs = clamp_secs(self.sequence.pause_secs, default_pause_secs());
        self.sequence.flash_secs = clamp_secs(self.sequence.flash_secs, default_flash_secs());
        self.flash.speed_ms = self.flash.speed_ms.clamp(MIN_FLASH_SPEED_MS, MAX_FLASH_SPEED_MS);
        // "ALL" may have been saved before it was switched off
        if !self.include_all_range {
            if self.sequence.range == RangeSpec::All {
                self.sequence.range = RangeSpec::span(0, 9, false);
            }
            if self.flash.range == RangeSpec::All {
                self.flash.range = RangeSpec::span(0, 9, false);
            }
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_secs_f64(clamp_secs(self.sequence.pause_secs, default_pause_secs()))
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_secs_f64(clamp_secs(self.sequence.flash_secs, default_flash_secs()))
    }

    pub fn flash_period(&self) -> Duration {
        Duration::from_millis(self.flash.speed_ms)
    }

    pub fn sequence_policy(&self) -> SamplingPolicy {
        SamplingPolicy::from_no_repeats(self.sequence.no_repeats)
    }

    pub fn flash_policy(&self) -> SamplingPolicy {
        SamplingPolicy::from_no_repeats(self.flash.no_repeats)
    }
}

/// Settings given on the command line. They apply to one run and are never
/// written back to the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub theme: Option<String>,
    pub range: Option<RangeSpec>,
    pub count: Option<usize>,
    pub pause_secs: Option<f64>,
    pub flash_secs: Option<f64>,
    pub no_repeats: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref theme) = self.theme {
            config.theme = theme.clone();
        }
        if let Some(range) = self.range {
            config.sequence.range = range;
        }
        if let Some(count) = self.count {
            config.sequence.count = count;
        }
        if let Some(pause) = self.pause_secs {
            config.sequence.pause_secs = pause;
        }
        if let Some(flash) = self.flash_secs {
            config.sequence.flash_secs = flash;
        }
        if self.no_repeats {
            config.sequence.no_repeats = true;
            config.flash.no_repeats = true;
        }
        config.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.include_all_range);
        assert_eq!(config.scoring_policy, ScoringPolicy::CorrectLength);
        assert_eq!(config.sequence.range, RangeSpec::All);
        assert_eq!(config.sequence.count, 5);
        assert_eq!(config.flash.speed_ms, 2000);
        assert!(config.speech_command.is_none());
    }

    #[test]
    fn test_config_partial_sections() {
        let toml_str = r#"
voice = true
scoring_policy = "max_length"

[sequence]
range = "10-19"
no_repeats = true

[flash]
range = "0-9"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.voice);
        assert_eq!(config.scoring_policy, ScoringPolicy::MaxLength);
        assert_eq!(config.sequence.range, RangeSpec::span(10, 19, true));
        assert_eq!(config.sequence_policy(), SamplingPolicy::WithoutReplacement);
        // unspecified fields inside a section still default
        assert_eq!(config.sequence.pause_secs, 3.0);
        assert_eq!(config.flash.range, RangeSpec::span(0, 9, false));
        assert_eq!(config.flash.speed_ms, 2000);
    }

    #[test]
    fn test_config_rejects_bad_range() {
        let result: Result<Config, _> = toml::from_str("[sequence]\nrange = \"9-1\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.flash.range = RangeSpec::span(0, 9, true);
        config.speech_command = Some("espeak".to_string());
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.flash.range, config.flash.range);
        assert_eq!(deserialized.speech_command, config.speech_command);
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut config = Config::default();
        config.include_all_range = false;
        config.sequence.count = 0;
        config.sequence.pause_secs = -1.0;
        config.flash.speed_ms = 10;
        config.normalize();
        assert_eq!(config.sequence.count, 1);
        assert_eq!(config.sequence.pause_secs, 3.0);
        assert_eq!(config.flash.speed_ms, MIN_FLASH_SPEED_MS);
        assert_eq!(config.sequence.range, RangeSpec::span(0, 9, false));
    }

    #[test]
    fn test_normalize_caps_large_values() {
        let mut config = Config::default();
        config.sequence.pause_secs = 1e19;
        config.sequence.flash_secs = f64::MAX;
        config.sequence.count = usize::MAX;
        config.flash.speed_ms = u64::MAX;
        config.normalize();
        assert_eq!(config.sequence.pause_secs, MAX_DELAY_SECS);
        assert_eq!(config.sequence.flash_secs, MAX_DELAY_SECS);
        assert_eq!(config.sequence.count, MAX_SEQUENCE_COUNT);
        assert_eq!(config.flash.speed_ms, MAX_FLASH_SPEED_MS);
    }

    #[test]
    fn test_durations_are_bounded_without_normalize() {
        let mut config = Config::default();
        config.sequence.pause_secs = 1e19;
        config.sequence.flash_secs = f64::NAN;
        assert_eq!(config.pause(), Duration::from_secs(60));
        assert_eq!(config.flash_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_overrides_apply_and_normalize() {
        let mut config = Config::default();
        let overrides = Overrides {
            range: Some(RangeSpec::span(30, 39, true)),
            count: Some(0),
            pause_secs: Some(1e19),
            no_repeats: true,
            ..Overrides::default()
        };
        overrides.apply(&mut config);
        assert_eq!(config.sequence.range, RangeSpec::span(30, 39, true));
        assert_eq!(config.sequence.count, 1);
        assert_eq!(config.sequence.pause_secs, MAX_DELAY_SECS);
        assert_eq!(config.flash_policy(), SamplingPolicy::WithoutReplacement);
        assert_eq!(config.theme, default_theme());
    }
}
