use otogame_charter::beat_detection::{pick_onsets, BeatDetection, PeakParams};
use otogame_charter::hold_detector::MIN_HOLD_DURATION;
use otogame_charter::onset::{extract_onset_curve, smooth_curve, OnsetConfig};
use otogame_charter::tempo::{estimate_bpm, quick_analyze_bpm, FOLD_MAX_BPM, FOLD_MIN_BPM};
use otogame_charter::{Charter, ChartEvent, ChartSource, CharterConfig, Difficulty};

const SR: u32 = 44100;

/// Broadband decaying bursts every `interval` samples
fn click_track(seconds: f32, interval: usize, burst: usize) -> Vec<f32> {
    let len = (seconds * SR as f32) as usize;
    let mut samples = vec![0.0f32; len];
    let mut start = 0;
    while start < len {
        for i in 0..burst.min(len - start) {
            let noise = (i * 7919 % 31) as f32 / 15.0 - 1.0;
            samples[start + i] = noise * (1.0 - i as f32 / burst as f32);
        }
        start += interval;
    }
    samples
}

/// Clicks with uneven spacing, loosely like a drum pattern
fn pattern_track(seconds: f32) -> Vec<f32> {
    let len = (seconds * SR as f32) as usize;
    let mut samples = vec![0.0f32; len];
    let offsets = [0.0f32, 0.25, 0.375, 0.5, 1.0, 1.25, 1.5, 1.75];
    let mut bar = 0.0f32;
    while bar < seconds {
        for off in offsets {
            let start = ((bar + off) * SR as f32) as usize;
            for i in 0..400 {
                if let Some(s) = samples.get_mut(start + i) {
                    *s = ((i * 104_729 % 53) as f32 / 26.0 - 1.0) * (1.0 - i as f32 / 400.0);
                }
            }
        }
        bar += 2.0;
    }
    samples
}

#[test]
fn silent_track_falls_back_to_even_grid() {
    let samples = vec![0.0f32; SR as usize * 10];
    assert_eq!(quick_analyze_bpm(&samples, SR), None);

    let charter = Charter::new(CharterConfig::default());
    let chart = charter.synthesize(&samples, SR, Difficulty::Normal, false, 42);

    assert_eq!(chart.source, ChartSource::Grid);
    assert!(!chart.is_empty());
    assert_eq!(chart.bpm, Some(120));

    let gaps: Vec<f32> = chart.events.windows(2).map(|w| w[1].time - w[0].time).collect();
    for gap in gaps {
        assert!((gap - 0.25).abs() < 1e-3, "uneven gap {}", gap);
    }
    assert!((chart.events[0].time - 0.8).abs() < 1e-6);
    assert!(chart.events.last().map_or(false, |e| e.time < 9.2));
}

#[test]
fn click_track_at_120_bpm_is_detected_exactly() {
    let samples = click_track(30.0, 22050, 441);
    assert_eq!(quick_analyze_bpm(&samples, SR), Some(120));

    let detection = BeatDetection::detect(&samples, SR, &OnsetConfig::default());
    assert_eq!(detection.bpm, Some(120));
    assert!(!detection.onsets.is_empty());
}

#[test]
fn folded_tempo_stays_in_range() {
    for interval in [9000usize, 14000, 18000, 26000, 33000, 40000] {
        let samples = click_track(20.0, interval, 300);
        if let Some(bpm) = quick_analyze_bpm(&samples, SR) {
            let bpm = bpm as f32;
            assert!(bpm >= FOLD_MIN_BPM && bpm <= FOLD_MAX_BPM, "bpm {} out of range", bpm);
        }
    }
}

#[test]
fn picked_onsets_are_ascending_and_spaced() {
    let samples = pattern_track(20.0);
    let curve = extract_onset_curve(&samples, SR, &OnsetConfig::default());
    let fps = curve.frames_per_second();
    let bpm = estimate_bpm(&curve.values, fps);
    let smoothed = smooth_curve(&curve.values, 3);

    let params = PeakParams::compute(&smoothed, bpm, fps);
    let min_gap_sec = params.min_gap as f32 * curve.hop_size as f32 / SR as f32;

    let onsets = pick_onsets(&smoothed, bpm, fps, curve.hop_size, SR);
    assert!(!onsets.is_empty());
    for pair in onsets.windows(2) {
        assert!(pair[1] > pair[0]);
        assert!(pair[1] - pair[0] >= min_gap_sec - 1e-6);
    }
}

#[test]
fn charts_are_well_formed_for_every_difficulty_and_seed() {
    let samples = pattern_track(40.0);
    let charter = Charter::new(CharterConfig::default());

    for seed in [1u64, 7, 1234] {
        for (difficulty, chart) in charter.generate_all_difficulties(&samples, SR, false, seed) {
            assert!(!chart.is_empty(), "{} chart empty", difficulty);
            for pair in chart.events.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(
                    a.time < b.time || (a.time == b.time && a.lane < b.lane),
                    "{}: events out of order or duplicated at {}",
                    difficulty,
                    a.time
                );
            }
            for event in &chart.events {
                assert!(event.lane < 6);
                if event.is_hold() {
                    assert!(event.end_time() - event.time > MIN_HOLD_DURATION);
                }
            }
            assert_holds_block_their_lane(&chart.events);
        }
    }
}

/// No other event may start on a hold's lane while the hold is down
fn assert_holds_block_their_lane(events: &[ChartEvent]) {
    for (i, hold) in events.iter().enumerate().filter(|(_, e)| e.is_hold()) {
        for (j, other) in events.iter().enumerate() {
            if i == j || other.lane != hold.lane {
                continue;
            }
            assert!(
                other.time < hold.time || other.time >= hold.end_time(),
                "lane {}: event at {} inside hold {}..{}",
                hold.lane,
                other.time,
                hold.time,
                hold.end_time()
            );
        }
    }
}

#[test]
fn dense_charts_keep_lanes_exclusive() {
    let samples = click_track(30.0, 8820, 300);
    let charter = Charter::new(CharterConfig::default());

    for seed in 0..6u64 {
        for (_, chart) in charter.generate_all_difficulties(&samples, SR, false, seed) {
            for hold in chart.events.iter().filter(|e| e.is_hold()) {
                assert!(hold.end_time() - hold.time > MIN_HOLD_DURATION);
            }
            assert_holds_block_their_lane(&chart.events);
        }
    }
}

#[test]
fn same_seed_reproduces_chart() {
    let samples = pattern_track(30.0);
    let charter = Charter::new(CharterConfig::default());

    let a = charter.synthesize(&samples, SR, Difficulty::Hard, false, 99);
    let b = charter.synthesize(&samples, SR, Difficulty::Hard, false, 99);
    assert_eq!(a.events, b.events);

    let grid_a = charter.synthesize(&samples, SR, Difficulty::Hard, true, 5);
    let grid_b = charter.synthesize(&samples, SR, Difficulty::Hard, true, 5);
    assert_eq!(grid_a.events, grid_b.events);
}
