//! Engine tuning knobs.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Durations are whole seconds.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use thiserror::Error;

use crate::progression::LevelCurve;
use crate::quest::rarity::{RarityTier, DEFAULT_RARITY_TABLE};
use crate::sweep::SweepRules;

pub const CONFIG_PATH_ENV: &str = "SQ_CONFIG_PATH";

/// Longest accepted duration setting, about a century
pub const MAX_DURATION_SECS: i64 = 100 * 365 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub rarity_table: Vec<RarityTier>,
    pub level_curve: LevelCurve,
    pub sweep_interval_secs: u64,
    pub popup_duration_secs: u64,
    pub reminder_window_secs: i64,
    pub penalty_delay_secs: i64,
    pub penalty_rate: f64,
    pub history_cap: usize,
    pub daily_quest_count: usize,
    pub daily_check_interval_secs: u64,
    /// Due time given to generated quests, relative to creation. `None`
    /// leaves generated quests without a deadline.
    pub generated_due_in_secs: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rarity_table: DEFAULT_RARITY_TABLE.to_vec(),
            level_curve: LevelCurve::default(),
            sweep_interval_secs: 30,
            popup_duration_secs: 7,
            reminder_window_secs: 60,
            penalty_delay_secs: 24 * 60 * 60,
            penalty_rate: 0.3,
            history_cap: 200,
            daily_quest_count: 3,
            daily_check_interval_secs: 60 * 60,
            generated_due_in_secs: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `SQ_CONFIG_PATH`, or defaults when unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }

        tracing::info!(path, "loading engine config");
        Self::from_path(Path::new(path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in &self.rarity_table {
            let (min, max) = tier.reward_range;
            if min == 0 || min > max {
                return Err(ConfigError::Invalid(format!(
                    "reward range for {} must satisfy 0 < min <= max, got [{}, {}]",
                    tier.id.as_str(),
                    min,
                    max
                )));
            }
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweepIntervalSecs must be positive".into()));
        }
        if self.popup_duration_secs == 0 {
            return Err(ConfigError::Invalid("popupDurationSecs must be positive".into()));
        }
        if self.daily_check_interval_secs == 0 {
            return Err(ConfigError::Invalid("dailyCheckIntervalSecs must be positive".into()));
        }
        if self.reminder_window_secs < 0 || self.penalty_delay_secs < 0 {
            return Err(ConfigError::Invalid("reminder window and penalty delay must be >= 0".into()));
        }
        if self.generated_due_in_secs.is_some_and(|secs| secs < 0) {
            return Err(ConfigError::Invalid("generatedDueInSecs must be >= 0".into()));
        }
        let durations = [
            ("sweepIntervalSecs", i64::try_from(self.sweep_interval_secs).unwrap_or(i64::MAX)),
            ("popupDurationSecs", i64::try_from(self.popup_duration_secs).unwrap_or(i64::MAX)),
            ("dailyCheckIntervalSecs", i64::try_from(self.daily_check_interval_secs).unwrap_or(i64::MAX)),
            ("reminderWindowSecs", self.reminder_window_secs),
            ("penaltyDelaySecs", self.penalty_delay_secs),
            ("generatedDueInSecs", self.generated_due_in_secs.unwrap_or_default()),
        ];
        for (name, secs) in durations {
            if secs > MAX_DURATION_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at most {} seconds, got {}",
                    name, MAX_DURATION_SECS, secs
                )));
            }
        }
        if !self.penalty_rate.is_finite() || self.penalty_rate < 0.0 {
            return Err(ConfigError::Invalid("penaltyRate must be a non-negative number".into()));
        }
        if self.history_cap == 0 {
            return Err(ConfigError::Invalid("historyCap must be positive".into()));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        seconds(clamp_secs(self.sweep_interval_secs))
    }

    pub fn popup_duration(&self) -> Duration {
        seconds(clamp_secs(self.popup_duration_secs))
    }

    pub fn daily_check_interval(&self) -> Duration {
        seconds(clamp_secs(self.daily_check_interval_secs))
    }

    pub fn generated_due_in(&self) -> Option<Duration> {
        self.generated_due_in_secs.map(seconds)
    }

    pub fn sweep_rules(&self) -> SweepRules {
        SweepRules {
            reminder_window: seconds(self.reminder_window_secs),
            penalty_delay: seconds(self.penalty_delay_secs),
            penalty_rate: self.penalty_rate,
        }
    }
}

fn clamp_secs(secs: u64) -> i64 {
    secs.min(MAX_DURATION_SECS as u64) as i64
}

/// Unvalidated configs are clamped to the accepted range
fn seconds(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(-MAX_DURATION_SECS, MAX_DURATION_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sweep_interval(), Duration::seconds(30));
        assert_eq!(config.popup_duration(), Duration::seconds(7));
        assert_eq!(config.sweep_rules().penalty_delay, Duration::hours(24));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"sweepIntervalSecs": 5, "historyCap": 50}"#).unwrap();
        assert_eq!(config.sweep_interval_secs, 5);
        assert_eq!(config.history_cap, 50);
        assert_eq!(config.popup_duration_secs, 7);
        assert_eq!(config.rarity_table.len(), 4);
    }

    #[test]
    fn test_inverted_reward_range_rejected() {
        let json = r#"{"rarityTable": [{"id": "common", "weight": 1, "rewardRange": [50, 10]}]}"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let config = EngineConfig::from_json(r#"{"sweepIntervalSecs": 18446744073709551615}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig::from_json(r#"{"penaltyDelaySecs": 9223372036854775807}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig::from_json(r#"{"generatedDueInSecs": -60}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig { generated_due_in_secs: Some(MAX_DURATION_SECS), ..EngineConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unvalidated_durations_are_clamped() {
        let config = EngineConfig {
            sweep_interval_secs: u64::MAX,
            reminder_window_secs: i64::MIN,
            penalty_delay_secs: i64::MAX,
            generated_due_in_secs: Some(i64::MAX),
            ..EngineConfig::default()
        };
        let limit = Duration::seconds(MAX_DURATION_SECS);

        assert_eq!(config.sweep_interval(), limit);
        assert_eq!(config.generated_due_in(), Some(limit));
        let rules = config.sweep_rules();
        assert_eq!(rules.reminder_window, -limit);
        assert_eq!(rules.penalty_delay, limit);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dailyQuestCount": 5}}"#).unwrap();

        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.daily_quest_count, 5);

        let missing = EngineConfig::from_path(Path::new("/nonexistent/sq-config.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
