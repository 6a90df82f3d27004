pub mod audio;
pub mod beat_detection;
pub mod chart;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod exporter;
pub mod hold_detector;
pub mod lane_assigner;
pub mod onset;
pub mod postprocess;
pub mod quantizer;
pub mod spectrum;
pub mod tempo;
pub mod worker;

pub use chart::{Chart, ChartEvent, ChartSource, NoteKind};
pub use config::CharterConfig;
pub use difficulty::{Difficulty, DifficultyProfile};
pub use error::{CharterError, Result};

use beat_detection::BeatDetection;
use chart::{generate_grid_chart, sort_events};
use hold_detector::HoldDetector;
use lane_assigner::LaneAssigner;
use postprocess::{reduce_syncopation, smooth_bursts};
use quantizer::{fit_grid_weights, Quantizer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempo::quick_analyze_bpm;

/// Onset charts with fewer events are replaced by the grid fallback
pub const MIN_ONSET_CHART_EVENTS: usize = 12;

const DEFAULT_BPM: u32 = 120;

/// Main charter that orchestrates the entire process
pub struct Charter {
    config: CharterConfig,
}

impl Charter {
    pub fn new(config: CharterConfig) -> Self {
        Charter { config }
    }

    pub fn config(&self) -> &CharterConfig {
        &self.config
    }

    /// Analyse mono samples once
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> BeatDetection {
        BeatDetection::detect(samples, sample_rate, &self.config.analysis)
    }

    /// Build a chart for one difficulty.
    ///
    /// `bgm_mode` skips onset analysis and goes straight to the grid chart.
    /// Equal inputs and `seed` give identical charts.
    pub fn synthesize(
        &self,
        samples: &[f32],
        sample_rate: u32,
        difficulty: Difficulty,
        bgm_mode: bool,
        seed: u64,
    ) -> Chart {
        let mut rng = StdRng::seed_from_u64(seed);
        let duration = duration_of(samples, sample_rate);

        if bgm_mode {
            log::info!("BGM mode: using grid chart for {}", difficulty);
            let bpm = quick_analyze_bpm(samples, sample_rate).unwrap_or(DEFAULT_BPM);
            return generate_grid_chart(duration, difficulty, bpm, self.config.lanes, &mut rng);
        }

        let detection = self.analyze(samples, sample_rate);
        self.chart_from_detection(&detection, samples, sample_rate, difficulty, &mut rng)
    }

    /// Generate a chart for every difficulty from a single analysis pass
    pub fn generate_all_difficulties(
        &self,
        samples: &[f32],
        sample_rate: u32,
        bgm_mode: bool,
        seed: u64,
    ) -> Vec<(Difficulty, Chart)> {
        if bgm_mode {
            return Difficulty::ALL
                .iter()
                .map(|&d| (d, self.synthesize(samples, sample_rate, d, true, seed)))
                .collect();
        }

        let detection = self.analyze(samples, sample_rate);
        Difficulty::ALL
            .iter()
            .map(|&d| {
                let mut rng = StdRng::seed_from_u64(seed);
                let chart = self.chart_from_detection(&detection, samples, sample_rate, d, &mut rng);
                (d, chart)
            })
            .collect()
    }

    fn chart_from_detection<R: Rng + ?Sized>(
        &self,
        detection: &BeatDetection,
        samples: &[f32],
        sample_rate: u32,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Chart {
        let profile = self.config.profile(difficulty);
        let events = self.place_events(detection, difficulty, &profile, rng);

        if events.len() < MIN_ONSET_CHART_EVENTS {
            log::info!(
                "Onset chart for {} too sparse ({} events), using grid fallback",
                difficulty,
                events.len()
            );
            let bpm = detection
                .bpm
                .or_else(|| quick_analyze_bpm(samples, sample_rate))
                .unwrap_or(DEFAULT_BPM);
            let duration = duration_of(samples, sample_rate);
            return generate_grid_chart(duration, difficulty, bpm, self.config.lanes, rng);
        }

        log::info!(
            "Chart for {}: {} events ({} holds)",
            difficulty,
            events.len(),
            events.iter().filter(|e| e.is_hold()).count()
        );

        Chart {
            events,
            bpm: detection.bpm,
            phase: detection.phase,
            source: ChartSource::Onsets,
        }
    }

    /// Thin, quantize and place onsets on lanes, then post-process.
    fn place_events<R: Rng + ?Sized>(
        &self,
        detection: &BeatDetection,
        difficulty: Difficulty,
        profile: &DifficultyProfile,
        rng: &mut R,
    ) -> Vec<ChartEvent> {
        let bpm = detection.bpm;
        let weights = match bpm {
            Some(b) => fit_grid_weights(&detection.onsets, b, &profile.grid_weights, difficulty),
            None => profile.grid_weights,
        };
        let stride = profile.onset_stride();
        let quantizer = bpm.map(Quantizer::new);
        let holds = HoldDetector::new(profile);
        let min_interval = profile.min_global_interval();

        let mut lanes = LaneAssigner::new(self.config.lanes, profile.min_per_lane_interval());
        let mut events = Vec::new();
        let mut last_emitted = f32::NEG_INFINITY;

        for &onset in detection.onsets.iter().step_by(stride) {
            let t = match &quantizer {
                Some(q) => q.quantize(onset, &weights, profile.snap_window(), rng),
                None => onset,
            };

            if t - last_emitted < min_interval {
                continue;
            }

            let lane = match lanes.assign(t) {
                Some(lane) => lane,
                None => continue,
            };

            let hold_end = bpm.and_then(|b| holds.try_hold(t, b, rng));
            if let Some(end) = hold_end {
                events.push(ChartEvent::hold(t, end, lane));
                lanes.occupy(lane, end, true);
                last_emitted = t;
                continue;
            }

            events.push(ChartEvent::tap(t, lane));
            lanes.occupy(lane, t, true);
            last_emitted = t;

            if rng.gen::<f32>() < profile.chord_probability {
                if let Some(second) = lanes.chord_lane(t, lane, rng) {
                    events.push(ChartEvent::tap(t, second));
                    lanes.occupy(second, t, false);
                }
            }
        }

        let events = match bpm {
            Some(b) if difficulty != Difficulty::Hard => reduce_syncopation(events, b),
            _ => events,
        };
        let mut events = smooth_bursts(events, profile.burst_window_ms, profile.burst_limit);
        sort_events(&mut events);
        events
    }
}

fn duration_of(samples: &[f32], sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        0.0
    } else {
        samples.len() as f32 / sample_rate as f32
    }
}
