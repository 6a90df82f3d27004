use crate::onset::{extract_onset_curve, smooth_curve, OnsetConfig};
use crate::tempo::estimate_bpm;

/// Width of the Gaussian kernel used to score onsets against the half-beat grid
const ALIGN_SIGMA: f32 = 0.025;
const ALIGN_STEPS: usize = 96;
const ALIGN_MAX_ONSETS: usize = 64;
/// Larger phase corrections than this are treated as unreliable and ignored
pub const MAX_ALIGN_SHIFT: f32 = 1.5;

#[derive(Clone, Debug)]
pub struct BeatDetection {
    pub onsets: Vec<f32>,          // onset times in seconds, ascending
    pub bpm: Option<u32>,          // estimated BPM
    pub phase: f32,                // grid alignment applied to `onsets`
    pub onset_strengths: Vec<f32>, // smoothed onset curve
}

/// Peak picking parameters derived from the curve and tempo
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakParams {
    pub threshold: f32,
    pub neighborhood: usize,
    pub min_gap: usize, // frames, 0 disables
}

impl PeakParams {
    pub fn compute(curve: &[f32], bpm: Option<u32>, fps: f32) -> Self {
        let n = curve.len().max(1) as f32;
        let mean = curve.iter().sum::<f32>() / n;
        let var = curve.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        let threshold = (mean + 0.6 * var.sqrt()).clamp(0.15, 0.6);

        let neighborhood = match bpm {
            Some(b) if b > 160 => 2,
            Some(b) if b < 90 => 4,
            _ => 3,
        };

        let min_gap = match bpm {
            Some(b) if b > 0 && fps > 0.0 => {
                let eighth = (60.0 / b as f32) / 8.0;
                ((eighth * fps).round() as usize).max(1)
            }
            _ => 0,
        };

        PeakParams {
            threshold,
            neighborhood,
            min_gap,
        }
    }
}

impl BeatDetection {
    /// Extract onsets, tempo and beat phase from mono samples
    pub fn detect(samples: &[f32], sample_rate: u32, config: &OnsetConfig) -> Self {
        let curve = extract_onset_curve(samples, sample_rate, config);
        let fps = curve.frames_per_second();
        let bpm = estimate_bpm(&curve.values, fps);

        let smoothed = smooth_curve(&curve.values, 3);
        let raw = pick_onsets(&smoothed, bpm, fps, curve.hop_size, sample_rate);
        let (onsets, phase) = match bpm {
            Some(b) => align_to_grid(raw, b),
            None => (raw, 0.0),
        };

        log::info!(
            "Detected {} onsets, BPM {}, phase {:.3}s",
            onsets.len(),
            bpm.map(|b| b.to_string()).unwrap_or_else(|| "unknown".into()),
            phase
        );

        BeatDetection {
            onsets,
            bpm,
            phase,
            onset_strengths: smoothed,
        }
    }
}

/// Threshold, pick and thin peaks of an (already smoothed) onset curve, returning times in seconds.
pub fn pick_onsets(
    curve: &[f32],
    bpm: Option<u32>,
    fps: f32,
    hop_size: usize,
    sample_rate: u32,
) -> Vec<f32> {
    let params = PeakParams::compute(curve, bpm, fps);
    let peaks = pick_peaks(curve, params.threshold, params.neighborhood);
    let peaks = enforce_min_gap(&peaks, params.min_gap);

    log::debug!(
        "Peak picking: thr={:.3} nb={} min_gap={} -> {} peaks",
        params.threshold,
        params.neighborhood,
        params.min_gap,
        peaks.len()
    );

    peaks
        .iter()
        .map(|&idx| (idx * hop_size) as f32 / sample_rate as f32)
        .collect()
}

/// Find local peaks in a curve.
///
/// A candidate must reach `threshold`, be strictly greater than every earlier
/// neighbor and not be exceeded by any later one; an equal later value keeps it,
/// an equal earlier value voids it.
pub fn pick_peaks(data: &[f32], threshold: f32, neighborhood: usize) -> Vec<usize> {
    let nb = neighborhood.max(1);
    if data.len() < 2 * nb + 1 {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    for i in nb..data.len() - nb {
        let v = data[i];
        if v < threshold {
            continue;
        }
        let is_peak = (1..=nb).all(|j| data[i - j] < v && data[i + j] <= v);
        if is_peak {
            peaks.push(i);
        }
    }
    peaks
}

/// Drop peaks closer than `min_gap` frames to the previously accepted one
pub fn enforce_min_gap(peaks: &[usize], min_gap: usize) -> Vec<usize> {
    if min_gap == 0 {
        return peaks.to_vec();
    }

    let mut filtered = Vec::with_capacity(peaks.len());
    let mut last: Option<usize> = None;
    for &i in peaks {
        if last.map_or(true, |l| i - l >= min_gap) {
            filtered.push(i);
            last = Some(i);
        }
    }
    filtered
}

/// Phase in `[0, half_beat)` that best fits the first onsets to the half-beat grid.
pub fn compute_beat_alignment_offset(onsets: &[f32], bpm: u32) -> f32 {
    if onsets.is_empty() || bpm == 0 {
        return 0.0;
    }

    let q = (60.0 / bpm as f32) / 2.0;
    let first = &onsets[..onsets.len().min(ALIGN_MAX_ONSETS)];

    let mut best_phi = 0.0f32;
    let mut best_score = f32::NEG_INFINITY;
    for s in 0..ALIGN_STEPS {
        let phi = (s as f32 / ALIGN_STEPS as f32) * q;
        let score: f32 = first
            .iter()
            .map(|&t| {
                let rel = t - phi;
                let d = rel - (rel / q).round() * q;
                (-(d * d) / (2.0 * ALIGN_SIGMA * ALIGN_SIGMA)).exp()
            })
            .sum();
        if score > best_score {
            best_score = score;
            best_phi = phi;
        }
    }
    best_phi
}

/// Shift onsets by the alignment phase and keep them non-negative.
///
/// Returns the (possibly unchanged) onsets and the phase that was applied.
pub fn align_to_grid(onsets: Vec<f32>, bpm: u32) -> (Vec<f32>, f32) {
    if onsets.is_empty() {
        return (onsets, 0.0);
    }

    let phi = compute_beat_alignment_offset(&onsets, bpm);
    if !phi.is_finite() || phi.abs() > MAX_ALIGN_SHIFT {
        return (onsets, 0.0);
    }

    let mut shifted: Vec<f32> = onsets.iter().map(|t| t - phi).collect();
    let t_min = shifted.iter().cloned().fold(f32::INFINITY, f32::min);
    if t_min < 0.0 {
        shifted.iter_mut().for_each(|t| *t -= t_min);
    }
    (shifted, phi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_peaks() {
        let data = vec![0.0, 1.0, 0.5, 2.0, 0.5, 1.5, 0.0];
        let peaks = pick_peaks(&data, 0.3, 1);
        assert_eq!(peaks, vec![1, 3, 5]);
    }

    #[test]
    fn test_plateau_keeps_first_sample() {
        // later equal value keeps the first, earlier equal value voids the second
        let data = vec![0.0, 0.0, 0.8, 0.8, 0.0, 0.0];
        assert_eq!(pick_peaks(&data, 0.3, 1), vec![2]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let data = vec![0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0];
        assert_eq!(pick_peaks(&data, 0.5, 3), vec![3]);
        assert!(pick_peaks(&data, 0.51, 3).is_empty());
    }

    #[test]
    fn test_peak_params() {
        let flat = vec![0.0; 100];
        let p = PeakParams::compute(&flat, None, 86.0);
        assert_eq!(p.threshold, 0.15);
        assert_eq!(p.neighborhood, 3);
        assert_eq!(p.min_gap, 0);

        let p = PeakParams::compute(&flat, Some(170), 86.0);
        assert_eq!(p.neighborhood, 2);
        let p = PeakParams::compute(&flat, Some(85), 86.0);
        assert_eq!(p.neighborhood, 4);

        // 120 BPM eighth-note period is 62.5 ms -> 5.38 frames at 86 fps
        let p = PeakParams::compute(&flat, Some(120), 86.0);
        assert_eq!(p.min_gap, 5);

        let ones = vec![1.0; 100];
        assert_eq!(PeakParams::compute(&ones, None, 86.0).threshold, 0.6);
    }

    #[test]
    fn test_min_gap() {
        let peaks = vec![0, 3, 5, 9, 10, 20];
        assert_eq!(enforce_min_gap(&peaks, 5), vec![0, 5, 10, 20]);
        assert_eq!(enforce_min_gap(&peaks, 0), peaks);
    }

    #[test]
    fn test_alignment_recovers_phase() {
        // half-beat grid at 120 BPM is 0.25 s, shifted by 0.1 s
        let onsets: Vec<f32> = (0..40).map(|k| 0.1 + k as f32 * 0.25).collect();
        let phi = compute_beat_alignment_offset(&onsets, 120);
        assert!((phi - 0.1).abs() < 0.25 / 96.0 + 1e-4, "phi {}", phi);
    }

    #[test]
    fn test_align_keeps_times_non_negative() {
        let onsets: Vec<f32> = (0..20).map(|k| 0.05 + k as f32 * 0.25).collect();
        let (aligned, phi) = align_to_grid(onsets, 120);
        assert!(phi > 0.0);
        assert!(aligned.iter().all(|&t| t >= 0.0));
        assert!(aligned.windows(2).all(|w| w[1] > w[0]));
    }
}
