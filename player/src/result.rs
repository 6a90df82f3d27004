use crate::game::{HitRecord, JudgementCounts};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recommended offsets never leave this range
pub const MAX_OFFSET_MS: i32 = 200;
/// Average deviation below this is reported as fine
const HINT_TOLERANCE_MS: f32 = 10.0;

/// Final (or live) outcome of a play session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayResult {
    pub score: u32,
    pub max_score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub counts: JudgementCounts,
    pub hit_errors: Vec<f32>,
    pub hit_log: Vec<HitRecord>,
}

impl PlayResult {
    pub fn accuracy(&self) -> f32 {
        accuracy(self.score, self.max_score)
    }

    pub fn rank(&self) -> Rank {
        Rank::from_score(self.score, self.max_score)
    }

    pub fn error_stats(&self) -> ErrorStats {
        ErrorStats::from_errors(&self.hit_errors)
    }
}

/// Score as a percentage of the maximum
pub fn accuracy(score: u32, max_score: u32) -> f32 {
    if max_score == 0 {
        0.0
    } else {
        score as f32 / max_score as f32 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
}

impl Rank {
    pub fn from_score(score: u32, max_score: u32) -> Self {
        let rate = if max_score == 0 {
            0.0
        } else {
            score as f64 / max_score as f64
        };
        if rate >= 0.95 {
            Rank::S
        } else if rate >= 0.90 {
            Rank::A
        } else if rate >= 0.80 {
            Rank::B
        } else if rate >= 0.70 {
            Rank::C
        } else {
            Rank::D
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
        };
        f.pad(s)
    }
}

/// Timing error summary in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub avg_abs_ms: f32,
    pub avg_signed_ms: f32,
}

impl ErrorStats {
    /// From signed errors in seconds; zeros when there are none
    pub fn from_errors(errors: &[f32]) -> Self {
        if errors.is_empty() {
            return Self::default();
        }
        let n = errors.len() as f32;
        let sum: f32 = errors.iter().sum();
        let sum_abs: f32 = errors.iter().map(|e| e.abs()).sum();
        Self {
            avg_abs_ms: sum_abs / n * 1000.0,
            avg_signed_ms: sum / n * 1000.0,
        }
    }
}

/// New input offset that cancels the average deviation of `deltas_ms`.
///
/// `None` without samples.
pub fn recommend_offset(current_offset_ms: i32, deltas_ms: &[f32]) -> Option<i32> {
    if deltas_ms.is_empty() {
        return None;
    }
    let avg = deltas_ms.iter().sum::<f32>() / deltas_ms.len() as f32;
    let offset = (current_offset_ms as f32 - avg).round() as i32;
    Some(offset.clamp(-MAX_OFFSET_MS, MAX_OFFSET_MS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetHint {
    /// Hits land late; lower the offset by this many ms
    Late(i32),
    /// Hits land early; raise the offset by this many ms
    Early(i32),
    Good,
}

pub fn offset_hint(avg_signed_ms: f32) -> OffsetHint {
    if avg_signed_ms > HINT_TOLERANCE_MS {
        OffsetHint::Late(avg_signed_ms.round() as i32)
    } else if avg_signed_ms < -HINT_TOLERANCE_MS {
        OffsetHint::Early((-avg_signed_ms).round() as i32)
    } else {
        OffsetHint::Good
    }
}

impl fmt::Display for OffsetHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetHint::Late(ms) => write!(f, "Hits are late on average; lower the offset by {} ms", ms),
            OffsetHint::Early(ms) => write!(f, "Hits are early on average; raise the offset by {} ms", ms),
            OffsetHint::Good => write!(f, "Offset looks good"),
        }
    }
}
