use crate::difficulty::Difficulty;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Grid charts leave this much room at both ends of the track
const GRID_MARGIN: f32 = 0.8;
const GRID_CHORD_PROBABILITY: f32 = 0.12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteKind {
    Tap,
    Hold { end: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartEvent {
    pub time: f32, // seconds
    pub lane: usize,
    #[serde(flatten)]
    pub kind: NoteKind,
}

impl ChartEvent {
    pub fn tap(time: f32, lane: usize) -> Self {
        ChartEvent {
            time,
            lane,
            kind: NoteKind::Tap,
        }
    }

    pub fn hold(time: f32, end: f32, lane: usize) -> Self {
        ChartEvent {
            time,
            lane,
            kind: NoteKind::Hold { end },
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.kind, NoteKind::Hold { .. })
    }

    /// Hold tail time, or the tap time itself
    pub fn end_time(&self) -> f32 {
        match self.kind {
            NoteKind::Tap => self.time,
            NoteKind::Hold { end } => end,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSource {
    /// Built from detected onsets
    Onsets,
    /// Evenly spaced fallback
    Grid,
}

#[derive(Clone, Debug)]
pub struct Chart {
    pub events: Vec<ChartEvent>,
    pub bpm: Option<u32>,
    pub phase: f32,
    pub source: ChartSource,
}

impl Chart {
    pub fn hold_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_hold()).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Sort by time, then lane
pub fn sort_events(events: &mut [ChartEvent]) {
    events.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap_or(Ordering::Equal)
            .then(a.lane.cmp(&b.lane))
    });
}

/// Evenly spaced taps cycling through the lanes, for tracks without usable onsets.
pub fn generate_grid_chart<R: Rng + ?Sized>(
    duration: f32,
    difficulty: Difficulty,
    bpm: u32,
    lane_count: usize,
    rng: &mut R,
) -> Chart {
    let bpm = if bpm == 0 { 120 } else { bpm };
    let step = (60.0 / bpm as f32) * difficulty.grid_step_beats();
    let tail = (duration - GRID_MARGIN).max(0.0);

    let mut events = Vec::new();
    if lane_count > 0 {
        let mut lane = 0usize;
        let mut k = 0usize;
        loop {
            let t = GRID_MARGIN + k as f32 * step;
            if t >= tail {
                break;
            }
            lane = (lane + 1) % lane_count;
            events.push(ChartEvent::tap(t, lane));
            if difficulty == Difficulty::Hard && rng.gen::<f32>() < GRID_CHORD_PROBABILITY {
                let second = (lane + 3) % lane_count;
                if second != lane {
                    events.push(ChartEvent::tap(t, second));
                }
            }
            k += 1;
        }
    }
    sort_events(&mut events);

    log::info!(
        "Grid chart ({}): {} events at {} BPM, step {:.3}s",
        difficulty,
        events.len(),
        bpm,
        step
    );

    Chart {
        events,
        bpm: Some(bpm),
        phase: 0.0,
        source: ChartSource::Grid,
    }
}
