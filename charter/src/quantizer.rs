use crate::difficulty::Difficulty;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Onsets beyond this count do not contribute to the grid fit
const GRID_FIT_MAX_ONSETS: usize = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridDivision {
    Whole,
    Half,
    Third,
    Quarter,
}

impl GridDivision {
    pub const ALL: [GridDivision; 4] = [
        GridDivision::Whole,
        GridDivision::Half,
        GridDivision::Third,
        GridDivision::Quarter,
    ];

    /// Fraction of a beat
    pub fn fraction(&self) -> f32 {
        match self {
            GridDivision::Whole => 1.0,
            GridDivision::Half => 1.0 / 2.0,
            GridDivision::Third => 1.0 / 3.0,
            GridDivision::Quarter => 1.0 / 4.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GridDivision::Whole => "1",
            GridDivision::Half => "1/2",
            GridDivision::Third => "1/3",
            GridDivision::Quarter => "1/4",
        }
    }
}

/// Relative weight of each beat division
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridWeights {
    #[serde(rename = "1")]
    pub whole: f32,
    #[serde(rename = "1/2")]
    pub half: f32,
    #[serde(rename = "1/3")]
    pub third: f32,
    #[serde(rename = "1/4")]
    pub quarter: f32,
}

impl GridWeights {
    pub fn new(whole: f32, half: f32, third: f32, quarter: f32) -> Self {
        GridWeights {
            whole,
            half,
            third,
            quarter,
        }
    }

    /// Hold tails only snap to half and quarter beats.
    pub fn hold_end() -> Self {
        GridWeights::new(0.0, 0.5, 0.0, 0.5)
    }

    pub fn get(&self, division: GridDivision) -> f32 {
        match division {
            GridDivision::Whole => self.whole,
            GridDivision::Half => self.half,
            GridDivision::Third => self.third,
            GridDivision::Quarter => self.quarter,
        }
    }

    fn get_mut(&mut self, division: GridDivision) -> &mut f32 {
        match division {
            GridDivision::Whole => &mut self.whole,
            GridDivision::Half => &mut self.half,
            GridDivision::Third => &mut self.third,
            GridDivision::Quarter => &mut self.quarter,
        }
    }

    pub fn total(&self) -> f32 {
        GridDivision::ALL.iter().map(|&d| self.get(d)).sum()
    }

    /// Weighted draw of a division; all-zero weights fall through to the last one.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> GridDivision {
        let total = match self.total() {
            t if t > 0.0 => t,
            _ => 1.0,
        };
        let mut r = rng.gen::<f32>() * total;
        for division in GridDivision::ALL {
            r -= self.get(division);
            if r <= 0.0 {
                return division;
            }
        }
        GridDivision::Quarter
    }
}

#[derive(Clone, Debug)]
pub struct Quantizer {
    pub bpm: f32,
}

impl Quantizer {
    pub fn new(bpm: u32) -> Self {
        Quantizer { bpm: bpm as f32 }
    }

    pub fn beat_period(&self) -> f32 {
        60.0 / self.bpm
    }

    /// Snap to the nearest grid point of `division` if it lies within `window` seconds.
    pub fn snap(&self, time: f32, division: GridDivision, window: f32) -> f32 {
        let q = self.beat_period() * division.fraction();
        let nearest = (time / q).round() * q;
        if (nearest - time).abs() <= window {
            nearest
        } else {
            time
        }
    }

    /// Snap to a division drawn from `weights`
    pub fn quantize<R: Rng + ?Sized>(
        &self,
        time: f32,
        weights: &GridWeights,
        window: f32,
        rng: &mut R,
    ) -> f32 {
        let division = weights.pick(rng);
        self.snap(time, division, window)
    }
}

/// Blend the profile's grid weights with how well the onsets actually fit each division.
pub fn fit_grid_weights(
    onsets: &[f32],
    bpm: u32,
    base: &GridWeights,
    difficulty: Difficulty,
) -> GridWeights {
    let period = 60.0 / bpm as f32;
    let sigma = difficulty.grid_fit_sigma();
    let first = &onsets[..onsets.len().min(GRID_FIT_MAX_ONSETS)];

    let mut scores = GridWeights::new(0.0, 0.0, 0.0, 0.0);
    for division in GridDivision::ALL {
        let q = period * division.fraction();
        *scores.get_mut(division) = first
            .iter()
            .map(|&t| {
                let d = t - (t / q).round() * q;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .sum();
    }

    let sum = match scores.total() {
        s if s > 0.0 => s,
        _ => 1.0,
    };
    let blend = difficulty.grid_fit_blend();

    let mut out = GridWeights::new(0.0, 0.0, 0.0, 0.0);
    for division in GridDivision::ALL {
        let fit = scores.get(division) / sum;
        *out.get_mut(division) = base.get(division) * (1.0 - blend) + fit * blend;
    }

    log::debug!(
        "Grid weights for {}: 1={:.2} 1/2={:.2} 1/3={:.2} 1/4={:.2}",
        difficulty,
        out.whole,
        out.half,
        out.third,
        out.quarter
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_snap_within_window() {
        let quantizer = Quantizer::new(120);
        // quarter-beat grid at 120 BPM is 0.125 s
        let snapped = quantizer.snap(0.135, GridDivision::Quarter, 0.02);
        assert!((snapped - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_snap_outside_window_is_untouched() {
        let quantizer = Quantizer::new(120);
        assert_eq!(quantizer.snap(0.19, GridDivision::Quarter, 0.04), 0.19);
    }

    #[test]
    fn test_pick_respects_zero_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = GridWeights::new(0.0, 1.0, 0.0, 0.0);
        for _ in 0..200 {
            assert_eq!(weights.pick(&mut rng), GridDivision::Half);
        }
    }

    #[test]
    fn test_pick_all_zero_falls_back_to_last() {
        let mut rng = StdRng::seed_from_u64(1);
        let weights = GridWeights::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(weights.pick(&mut rng), GridDivision::Quarter);
    }

    #[test]
    fn test_fit_favors_matching_grid() {
        // onsets on triplets at 100 BPM
        let period = 0.6;
        let onsets: Vec<f32> = (0..60).map(|k| 0.2 + k as f32 * period / 3.0).collect();
        let flat = GridWeights::new(0.25, 0.25, 0.25, 0.25);
        let w = fit_grid_weights(&onsets, 100, &flat, Difficulty::Hard);
        assert!(w.third > w.half);
        assert!(w.third > w.whole);
        assert!((w.total() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_weights_serialize_with_labels() {
        let json = serde_json::to_string(&GridWeights::hold_end()).unwrap();
        assert!(json.contains("\"1/2\":0.5"));
    }
}
