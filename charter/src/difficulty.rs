use crate::error::CharterError;
use crate::quantizer::GridWeights;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile::for_difficulty(*self)
    }

    /// Share of the empirical grid fit in the blended grid weights
    pub fn grid_fit_blend(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.30,
            Difficulty::Normal => 0.40,
            Difficulty::Hard => 0.55,
        }
    }

    /// Kernel width for the grid fit: looser on EASY, tighter on HARD
    pub fn grid_fit_sigma(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.028,
            Difficulty::Normal => 0.020,
            Difficulty::Hard => 0.016,
        }
    }

    /// Grid fallback step in beats
    pub fn grid_step_beats(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Normal => 0.5,
            Difficulty::Hard => 0.25,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Normal => "NORMAL",
            Difficulty::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(CharterError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Chart generation tuning for one difficulty tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub density: f32, // fraction of onsets kept
    pub chord_probability: f32,
    pub min_global_interval_ms: f32,
    pub min_per_lane_interval_ms: f32,
    pub snap_window_ms: f32,
    pub grid_weights: GridWeights,
    pub hold_probability: f32,
    pub hold_beat_range: (f32, f32),
    pub burst_window_ms: f32,
    pub burst_limit: usize,
}

impl DifficultyProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => DifficultyProfile {
                density: 0.36,
                chord_probability: 0.06,
                min_global_interval_ms: 200.0,
                min_per_lane_interval_ms: 240.0,
                snap_window_ms: 48.0,
                grid_weights: GridWeights::new(0.10, 0.60, 0.0, 0.30),
                hold_probability: 0.05,
                hold_beat_range: (1.0, 2.0),
                burst_window_ms: 320.0,
                burst_limit: 2,
            },
            Difficulty::Normal => DifficultyProfile {
                density: 0.60,
                chord_probability: 0.18,
                min_global_interval_ms: 160.0,
                min_per_lane_interval_ms: 200.0,
                snap_window_ms: 44.0,
                grid_weights: GridWeights::new(0.15, 0.50, 0.10, 0.25),
                hold_probability: 0.12,
                hold_beat_range: (1.0, 2.5),
                burst_window_ms: 280.0,
                burst_limit: 3,
            },
            Difficulty::Hard => DifficultyProfile {
                density: 0.90,
                chord_probability: 0.30,
                min_global_interval_ms: 120.0,
                min_per_lane_interval_ms: 170.0,
                snap_window_ms: 38.0,
                grid_weights: GridWeights::new(0.10, 0.35, 0.20, 0.35),
                hold_probability: 0.20,
                hold_beat_range: (1.0, 3.0),
                burst_window_ms: 240.0,
                burst_limit: 3,
            },
        }
    }

    /// Keep every n-th onset
    pub fn onset_stride(&self) -> usize {
        if self.density <= 0.0 {
            return usize::MAX;
        }
        ((1.0 / self.density + 0.5).round() as usize).max(1)
    }

    pub fn snap_window(&self) -> f32 {
        self.snap_window_ms / 1000.0
    }

    pub fn min_global_interval(&self) -> f32 {
        self.min_global_interval_ms / 1000.0
    }

    pub fn min_per_lane_interval(&self) -> f32 {
        self.min_per_lane_interval_ms / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("expert".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Normal.to_string(), "NORMAL");
    }

    #[test]
    fn test_onset_stride() {
        assert_eq!(Difficulty::Easy.profile().onset_stride(), 3);
        assert_eq!(Difficulty::Normal.profile().onset_stride(), 2);
        assert_eq!(Difficulty::Hard.profile().onset_stride(), 2);
    }

    #[test]
    fn test_profiles_tighten_with_difficulty() {
        let easy = Difficulty::Easy.profile();
        let hard = Difficulty::Hard.profile();
        assert!(easy.density < hard.density);
        assert!(easy.min_global_interval_ms > hard.min_global_interval_ms);
        assert!(easy.hold_beat_range.1 < hard.hold_beat_range.1);
    }
}
