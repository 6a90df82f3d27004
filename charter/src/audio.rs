use crate::error::{CharterError, Result};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>, // interleaved
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    /// Load audio from a WAV file
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" | "wave" => Self::load_wav(path),
            ext => Err(CharterError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn load_wav(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                // Normalize by the declared bit depth, not by i32::MAX
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|sample| sample as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        log::debug!(
            "Loaded {} ({} Hz, {} ch, {} bit, {} samples)",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            samples.len()
        );

        Ok(AudioData {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Convert multi-channel audio to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        mix_to_mono(&self.samples, self.channels)
    }

    /// Get audio duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            0.0
        } else {
            self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
        }
    }
}

/// Average interleaved channels sample-wise.
pub fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect()
}
