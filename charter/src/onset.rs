use crate::spectrum::{hann_window, FrameTransform, Radix2Fft};
use serde::{Deserialize, Serialize};

/// Short-time analysis parameters for the onset curve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    /// Only the first `max_duration_sec` seconds are analysed; `None` analyses everything.
    /// Omitted from a config file, it means the whole track.
    #[serde(default)]
    pub max_duration_sec: Option<f32>,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        OnsetConfig {
            frame_size: 1024,
            hop_size: 512,
            max_duration_sec: Some(60.0),
        }
    }
}

/// Normalized positive spectral flux, one value per hop.
#[derive(Clone, Debug, Default)]
pub struct OnsetCurve {
    pub values: Vec<f32>,
    pub hop_size: usize,
    pub sample_rate: u32,
}

impl OnsetCurve {
    pub fn frames_per_second(&self) -> f32 {
        if self.hop_size == 0 {
            0.0
        } else {
            self.sample_rate as f32 / self.hop_size as f32
        }
    }

    /// Time in seconds of the hop at `index`
    pub fn time_of(&self, index: usize) -> f32 {
        (index * self.hop_size) as f32 / self.sample_rate as f32
    }

    /// Empty or all-zero curves carry no tempo information.
    pub fn is_degenerate(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extract the onset curve with the radix-2 transform
pub fn extract_onset_curve(samples: &[f32], sample_rate: u32, config: &OnsetConfig) -> OnsetCurve {
    let fft = Radix2Fft::new(config.frame_size);
    extract_onset_curve_with(&fft, samples, sample_rate, config)
}

pub fn extract_onset_curve_with<T: FrameTransform + ?Sized>(
    transform: &T,
    samples: &[f32],
    sample_rate: u32,
    config: &OnsetConfig,
) -> OnsetCurve {
    let frame_size = config.frame_size;
    let hop_size = config.hop_size.max(1);

    let limit = match config.max_duration_sec {
        Some(secs) => samples.len().min((sample_rate as f32 * secs).floor() as usize),
        None => samples.len(),
    };
    let samples = &samples[..limit];

    let num_frames = if samples.len() > frame_size {
        (samples.len() - frame_size) / hop_size
    } else {
        0
    };

    let window = hann_window(frame_size);
    let mut flux = Vec::with_capacity(num_frames);
    let mut prev_mag: Option<Vec<f32>> = None;
    let mut windowed = vec![0.0f32; frame_size];

    for i in 0..num_frames {
        let start = i * hop_size;
        for (out, (&s, &w)) in windowed
            .iter_mut()
            .zip(samples[start..start + frame_size].iter().zip(window.iter()))
        {
            *out = s * w;
        }

        let mag = transform.magnitude(&windowed);
        let value = match &prev_mag {
            Some(prev) => mag
                .iter()
                .zip(prev.iter())
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum(),
            None => 0.0,
        };
        flux.push(value);
        prev_mag = Some(mag);
    }

    log::debug!(
        "Onset curve: {} frames from {:.1}s of audio",
        flux.len(),
        samples.len() as f32 / sample_rate.max(1) as f32
    );

    OnsetCurve {
        values: normalize(&flux),
        hop_size,
        sample_rate,
    }
}

/// Divide by the maximum; an all-zero curve stays all-zero.
pub fn normalize(values: &[f32]) -> Vec<f32> {
    let max = values.iter().cloned().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / max).collect()
}

/// Smooth curve using a centered moving average
pub fn smooth_curve(data: &[f32], window_size: usize) -> Vec<f32> {
    if window_size <= 1 || data.is_empty() {
        return data.to_vec();
    }

    let half_window = window_size / 2;
    let mut smoothed = Vec::with_capacity(data.len());

    for i in 0..data.len() {
        let start = i.saturating_sub(half_window);
        let end = (i + half_window + 1).min(data.len());

        let avg = data[start..end].iter().sum::<f32>() / (end - start) as f32;
        smoothed.push(avg);
    }

    smoothed
}
