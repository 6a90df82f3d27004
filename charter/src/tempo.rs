use crate::onset::{extract_onset_curve, OnsetConfig};

pub const MIN_BPM: f32 = 60.0;
pub const MAX_BPM: f32 = 200.0;

/// Tempos are folded by octaves into this range.
pub const FOLD_MIN_BPM: f32 = 80.0;
pub const FOLD_MAX_BPM: f32 = 160.0;

/// Estimate tempo by autocorrelating the onset curve over lags for 60-200 BPM.
///
/// Returns `None` when no lag scores above zero, which covers empty and
/// all-zero curves.
pub fn estimate_bpm(curve: &[f32], fps: f32) -> Option<u32> {
    if curve.is_empty() || fps <= 0.0 {
        return None;
    }

    let min_lag = (((60.0 / MAX_BPM) * fps).floor() as usize).max(1);
    let max_lag = ((60.0 / MIN_BPM) * fps).floor() as usize;

    let mut best_lag = 0usize;
    let mut best_val = 0.0f32;
    for lag in min_lag..=max_lag.min(curve.len().saturating_sub(1)) {
        let sum: f32 = curve[..curve.len() - lag]
            .iter()
            .zip(curve[lag..].iter())
            .map(|(a, b)| a * b)
            .sum();
        if sum > best_val {
            best_val = sum;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return None;
    }

    let mut bpm = 60.0 * fps / best_lag as f32;
    while bpm < FOLD_MIN_BPM {
        bpm *= 2.0;
    }
    while bpm > FOLD_MAX_BPM {
        bpm /= 2.0;
    }

    log::debug!("Tempo: best lag {} (score {:.3}) -> {:.2} BPM", best_lag, best_val, bpm);
    Some(bpm.round() as u32)
}

/// Tempo from raw mono samples using the first 60 seconds only.
pub fn quick_analyze_bpm(samples: &[f32], sample_rate: u32) -> Option<u32> {
    let curve = extract_onset_curve(samples, sample_rate, &OnsetConfig::default());
    estimate_bpm(&curve.values, curve.frames_per_second())
}
