use crate::difficulty::DifficultyProfile;
use crate::quantizer::{GridWeights, Quantizer};
use rand::Rng;

/// Holds shorter than this are emitted as taps instead
pub const MIN_HOLD_DURATION: f32 = 0.35;

#[derive(Clone, Debug)]
pub struct HoldDetector {
    pub hold_probability: f32,
    pub beat_range: (f32, f32),
    pub snap_window: f32,
    pub min_hold_duration: f32,
}

impl HoldDetector {
    pub fn new(profile: &DifficultyProfile) -> Self {
        HoldDetector {
            hold_probability: profile.hold_probability,
            beat_range: profile.hold_beat_range,
            snap_window: profile.snap_window(),
            min_hold_duration: MIN_HOLD_DURATION,
        }
    }

    /// Roll for a hold starting at `time`; returns its grid-snapped end time.
    pub fn try_hold<R: Rng + ?Sized>(&self, time: f32, bpm: u32, rng: &mut R) -> Option<f32> {
        if rng.gen::<f32>() >= self.hold_probability {
            return None;
        }

        let (min_beats, max_beats) = self.beat_range;
        let beats = min_beats + rng.gen::<f32>() * (max_beats - min_beats);
        let quantizer = Quantizer::new(bpm);
        let end = time + beats * quantizer.beat_period();
        let end = quantizer.quantize(end, &GridWeights::hold_end(), self.snap_window, rng);

        if end - time > self.min_hold_duration {
            Some(end)
        } else {
            None
        }
    }
}
