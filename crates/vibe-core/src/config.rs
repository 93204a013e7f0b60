//! Engine configuration.
//!
//! Plain JSON, every field optional. An invalid file is an error rather
//! than a silent fallback: a zero interval would spin the simulator.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeError};
use crate::models::scale::{DETECTED_SCALE_COUNT, SCALE_UNIVERSE};

/// Environment variable naming a config file for [`EngineConfig::from_env`].
pub const CONFIG_ENV: &str = "VIBE_ALCHEMY_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Countdown start value; one tick per second.
    pub countdown_secs: u32,
    /// Length of the pseudo-recording window.
    pub recording_ms: u64,
    /// Period of the cosmetic level updates while recording.
    pub level_interval_ms: u64,
    /// Pause between the end of recording and the sample.
    pub analysis_delay_ms: u64,
    /// Labels per detected-scales set.
    pub sample_size: usize,
    /// Engine heartbeat period.
    pub tick_ms: u64,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
    /// Song catalog file; the built-in catalog when absent.
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            recording_ms: 10_000,
            level_interval_ms: 100,
            analysis_delay_ms: 2_000,
            sample_size: DETECTED_SCALE_COUNT,
            tick_ms: 50,
            seed: None,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the file named by `VIBE_ALCHEMY_CONFIG`, or defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                log::info!("vibe: loading config from {}", Path::new(&path).display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.recording_ms == 0 {
            return Err(VibeError::InvalidConfig("recording_ms must be positive".into()));
        }
        if self.level_interval_ms == 0 {
            return Err(VibeError::InvalidConfig("level_interval_ms must be positive".into()));
        }
        if self.tick_ms == 0 {
            return Err(VibeError::InvalidConfig("tick_ms must be positive".into()));
        }
        if self.sample_size == 0 || self.sample_size > SCALE_UNIVERSE.len() {
            return Err(VibeError::InvalidConfig(format!(
                "sample_size must be between 1 and {}",
                SCALE_UNIVERSE.len()
            )));
        }
        Ok(())
    }

    pub fn recording_window(&self) -> Duration {
        Duration::from_millis(self.recording_ms)
    }

    pub fn level_interval(&self) -> Duration {
        Duration::from_millis(self.level_interval_ms)
    }

    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.analysis_delay_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_capture_timeline() {
        let c = EngineConfig::default();
        assert_eq!(c.countdown_secs, 3);
        assert_eq!(c.recording_window(), Duration::from_secs(10));
        assert_eq!(c.level_interval(), Duration::from_millis(100));
        assert_eq!(c.analysis_delay(), Duration::from_secs(2));
        assert_eq!(c.sample_size, 3);
        c.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EngineConfig::from_json(r#"{"seed": 42, "countdown_secs": 1}"#).unwrap();
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.countdown_secs, 1);
        assert_eq!(c.recording_ms, 10_000);
    }

    #[test]
    fn zero_countdown_is_allowed() {
        EngineConfig::from_json(r#"{"countdown_secs": 0}"#).unwrap();
    }

    #[test]
    fn zero_intervals_are_rejected() {
        for json in [
            r#"{"recording_ms": 0}"#,
            r#"{"level_interval_ms": 0}"#,
            r#"{"tick_ms": 0}"#,
            r#"{"sample_size": 0}"#,
            r#"{"sample_size": 11}"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json(json), Err(VibeError::InvalidConfig(_))),
                "{} should be rejected",
                json
            );
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vibe.json");
        std::fs::write(&path, r#"{"analysis_delay_ms": 500}"#).unwrap();
        let c = EngineConfig::load(&path).unwrap();
        assert_eq!(c.analysis_delay(), Duration::from_millis(500));
    }
}
