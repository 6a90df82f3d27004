use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::error::{CharterError, Result};
use crate::onset::OnsetConfig;
use crate::quantizer::GridWeights;
use serde::Deserialize;
use std::path::Path;

/// Main charter configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CharterConfig {
    pub lanes: usize,
    pub analysis: OnsetConfig,
    pub profiles: ProfileOverrides,
}

impl Default for CharterConfig {
    fn default() -> Self {
        CharterConfig {
            lanes: 6,
            // Charts cover the whole track; only BPM-only analysis is capped
            analysis: OnsetConfig {
                max_duration_sec: None,
                ..OnsetConfig::default()
            },
            profiles: ProfileOverrides::default(),
        }
    }
}

impl CharterConfig {
    /// Parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: CharterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lanes == 0 {
            return Err(CharterError::InvalidSetting("lanes must be at least 1".into()));
        }
        if !self.analysis.frame_size.is_power_of_two() {
            return Err(CharterError::InvalidSetting(format!(
                "frame_size must be a power of two, got {}",
                self.analysis.frame_size
            )));
        }
        if self.analysis.hop_size == 0 {
            return Err(CharterError::InvalidSetting("hop_size must be positive".into()));
        }
        for difficulty in Difficulty::ALL {
            let profile = self.profile(difficulty);
            if profile.min_global_interval_ms <= 0.0 || profile.min_per_lane_interval_ms <= 0.0 {
                return Err(CharterError::InvalidSetting(format!(
                    "{}: note intervals must be positive",
                    difficulty
                )));
            }
        }
        Ok(())
    }

    /// Built-in profile with any configured overrides applied
    pub fn profile(&self, difficulty: Difficulty) -> DifficultyProfile {
        let mut profile = difficulty.profile();
        let overrides = match difficulty {
            Difficulty::Easy => &self.profiles.easy,
            Difficulty::Normal => &self.profiles.normal,
            Difficulty::Hard => &self.profiles.hard,
        };
        overrides.apply(&mut profile);
        profile
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub easy: ProfileOverride,
    pub normal: ProfileOverride,
    pub hard: ProfileOverride,
}

/// Partial `DifficultyProfile`; unset fields keep the built-in value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileOverride {
    pub density: Option<f32>,
    pub chord_probability: Option<f32>,
    pub min_global_interval_ms: Option<f32>,
    pub min_per_lane_interval_ms: Option<f32>,
    pub snap_window_ms: Option<f32>,
    pub grid_weights: Option<GridWeights>,
    pub hold_probability: Option<f32>,
    pub hold_beat_range: Option<(f32, f32)>,
    pub burst_window_ms: Option<f32>,
    pub burst_limit: Option<usize>,
}

impl ProfileOverride {
    pub fn apply(&self, profile: &mut DifficultyProfile) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field {
                    profile.$field = v;
                })*
            };
        }
        merge!(
            density,
            chord_probability,
            min_global_interval_ms,
            min_per_lane_interval_ms,
            snap_window_ms,
            grid_weights,
            hold_probability,
            hold_beat_range,
            burst_window_ms,
            burst_limit
        );
    }
}
