use crate::error::PlayerError;
use crate::input::{InputEvent, InputKind};
use crate::result::PlayResult;
use otogame_charter::ChartEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Presses are only matched against notes up to this far ahead of the press
const PRESS_LOOKAHEAD: f32 = 0.15;
/// Bonus for a hold that is kept down to its tail
pub const HOLD_COMPLETION_BONUS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Judgement {
    Perfect,
    Great,
    Good,
    Miss,
}

impl Judgement {
    pub fn points(&self) -> u32 {
        match self {
            Self::Perfect => 1000,
            Self::Great => 700,
            Self::Good => 300,
            Self::Miss => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Perfect => "PERFECT",
            Self::Great => "GREAT",
            Self::Good => "GOOD",
            Self::Miss => "MISS",
        }
    }
}

impl fmt::Display for Judgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Judge window width selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tightness {
    Narrow,
    #[default]
    Normal,
    Wide,
}

impl Tightness {
    fn scale(&self) -> f32 {
        match self {
            Self::Narrow => 0.8,
            Self::Normal => 1.0,
            Self::Wide => 1.25,
        }
    }
}

impl FromStr for Tightness {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "narrow" => Ok(Self::Narrow),
            "normal" => Ok(Self::Normal),
            "wide" => Ok(Self::Wide),
            _ => Err(PlayerError::UnknownTightness(s.to_string())),
        }
    }
}

/// Timing tolerances in seconds, each a ± bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgeWindow {
    pub perfect: f32,
    pub great: f32,
    pub good: f32,
}

impl JudgeWindow {
    pub fn from_tightness(tightness: Tightness) -> Self {
        let k = tightness.scale();
        JudgeWindow {
            perfect: 0.040 * k,
            great: 0.080 * k,
            good: 0.120 * k,
        }
    }

    /// Classify a signed timing error (positive is late)
    pub fn judge(&self, delta: f32) -> Judgement {
        let d = delta.abs();
        if d <= self.perfect {
            Judgement::Perfect
        } else if d <= self.great {
            Judgement::Great
        } else if d <= self.good {
            Judgement::Good
        } else {
            Judgement::Miss
        }
    }
}

impl Default for JudgeWindow {
    fn default() -> Self {
        Self::from_tightness(Tightness::Normal)
    }
}

/// Resolution state of one chart event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Unresolved,
    /// Tap resolved with a non-MISS judgement
    Hit(Judgement),
    /// Hold head hit; waiting for the release or the tail
    HeadJudged(Judgement),
    /// Hold kept to its tail; carries the head judgement
    Completed(Judgement),
    Missed,
}

impl NoteState {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Hit(_) | Self::Completed(_) | Self::Missed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct JudgementCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
}

impl JudgementCounts {
    pub fn record(&mut self, judgement: Judgement) {
        match judgement {
            Judgement::Perfect => self.perfect += 1,
            Judgement::Great => self.great += 1,
            Judgement::Good => self.good += 1,
            Judgement::Miss => self.miss += 1,
        }
    }

    pub fn get(&self, judgement: Judgement) -> u32 {
        match judgement {
            Judgement::Perfect => self.perfect,
            Judgement::Great => self.great,
            Judgement::Good => self.good,
            Judgement::Miss => self.miss,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.good + self.miss
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub note_time: f32,
    pub lane: usize,
    pub judgement: Judgement,
    pub error: Option<f32>, // signed seconds, None for misses
}

/// Live state of one play session.
///
/// Presses, releases and sweeps must be applied in timestamp order from a
/// single owner.
#[derive(Debug, Clone)]
pub struct PlayRuntime {
    events: Vec<ChartEvent>,
    states: Vec<NoteState>,
    lane_notes: Vec<Vec<usize>>,
    window: JudgeWindow,
    held: Vec<bool>,
    active_hold: Vec<Option<usize>>,
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub counts: JudgementCounts,
    pub hit_errors: Vec<f32>,
    pub hit_log: Vec<HitRecord>,
    pub current_time: f32,
}

impl PlayRuntime {
    /// `events` should be sorted by time; notes on lanes `>= lane_count` can never be pressed.
    pub fn new(events: Vec<ChartEvent>, window: JudgeWindow, lane_count: usize) -> Self {
        let mut lane_notes = vec![Vec::new(); lane_count];
        for (idx, event) in events.iter().enumerate() {
            if let Some(notes) = lane_notes.get_mut(event.lane) {
                notes.push(idx);
            }
        }

        let states = vec![NoteState::Unresolved; events.len()];
        Self {
            events,
            states,
            lane_notes,
            window,
            held: vec![false; lane_count],
            active_hold: vec![None; lane_count],
            score: 0,
            combo: 0,
            max_combo: 0,
            counts: JudgementCounts::default(),
            hit_errors: Vec::new(),
            hit_log: Vec::new(),
            current_time: 0.0,
        }
    }

    pub fn events(&self) -> &[ChartEvent] {
        &self.events
    }

    pub fn state(&self, idx: usize) -> Option<NoteState> {
        self.states.get(idx).copied()
    }

    pub fn window(&self) -> JudgeWindow {
        self.window
    }

    pub fn is_lane_held(&self, lane: usize) -> bool {
        self.held.get(lane).copied().unwrap_or(false)
    }

    pub fn max_score(&self) -> u32 {
        let holds = self.events.iter().filter(|e| e.is_hold()).count() as u32;
        self.events.len() as u32 * 1000 + holds * HOLD_COMPLETION_BONUS
    }

    /// Apply a recorded input event
    pub fn apply(&mut self, event: &InputEvent) -> Option<Judgement> {
        match event.kind {
            InputKind::Press => self.on_lane_press(event.lane, event.timestamp),
            InputKind::Release => {
                self.on_lane_release(event.lane, event.timestamp);
                None
            }
        }
    }

    /// Judge the nearest unresolved note in `lane`; `None` for a ghost tap.
    pub fn on_lane_press(&mut self, lane: usize, time: f32) -> Option<Judgement> {
        if lane >= self.lane_notes.len() {
            return None;
        }
        self.held[lane] = true;

        let mut best: Option<(usize, f32)> = None;
        for &idx in &self.lane_notes[lane] {
            if self.states[idx] != NoteState::Unresolved {
                continue;
            }
            let note_time = self.events[idx].time;
            let dt = (note_time - time).abs();
            if best.map_or(true, |(_, best_dt)| dt < best_dt) {
                best = Some((idx, dt));
            }
            if note_time > time + PRESS_LOOKAHEAD {
                break;
            }
        }

        let (idx, _) = best?;
        let delta = time - self.events[idx].time;
        Some(self.judge_head(idx, Some(delta)))
    }

    /// Release `lane`, completing its active hold if there is one.
    pub fn on_lane_release(&mut self, lane: usize, time: f32) {
        if let Some(held) = self.held.get_mut(lane) {
            *held = false;
        } else {
            return;
        }

        if let Some(idx) = self.active_hold[lane] {
            let end = self.events[idx].end_time();
            // Any release from `end - good` on counts as held to the tail
            let success = time >= end - self.window.good;
            self.complete_hold(idx, success);
        }
    }

    /// Advance the playhead: miss notes that scrolled past and settle expired holds.
    pub fn sweep(&mut self, now: f32) {
        self.current_time = self.current_time.max(now);
        let good = self.window.good;

        for idx in 0..self.events.len() {
            let event = self.events[idx];
            match self.states[idx] {
                NoteState::Unresolved if event.time < now - good => {
                    self.judge_head(idx, None);
                }
                NoteState::HeadJudged(_) if now > event.end_time() + good => {
                    let success = self.is_lane_held(event.lane);
                    self.complete_hold(idx, success);
                }
                _ => {}
            }
        }
    }

    /// Perfect play up to `now`: every due note is judged at its own time.
    pub fn autoplay(&mut self, now: f32) {
        self.current_time = self.current_time.max(now);
        for idx in 0..self.events.len() {
            let event = self.events[idx];
            match self.states[idx] {
                NoteState::Unresolved if now >= event.time => {
                    self.judge_head(idx, Some(0.0));
                    if event.is_hold() && now >= event.end_time() {
                        self.complete_hold(idx, true);
                    }
                }
                NoteState::HeadJudged(_) if now >= event.end_time() => {
                    self.complete_hold(idx, true);
                }
                _ => {}
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.states.iter().all(NoteState::is_final)
    }

    pub fn snapshot(&self) -> PlayResult {
        PlayResult {
            score: self.score,
            max_score: self.max_score(),
            combo: self.combo,
            max_combo: self.max_combo,
            counts: self.counts,
            hit_errors: self.hit_errors.clone(),
            hit_log: self.hit_log.clone(),
        }
    }

    /// Judge a tap or hold head; `None` forces a MISS.
    fn judge_head(&mut self, idx: usize, delta: Option<f32>) -> Judgement {
        let event = self.events[idx];
        let judgement = delta.map_or(Judgement::Miss, |d| self.window.judge(d));

        self.counts.record(judgement);
        if judgement == Judgement::Miss {
            self.states[idx] = NoteState::Missed;
            self.combo = 0;
            self.hit_log.push(HitRecord {
                note_time: event.time,
                lane: event.lane,
                judgement,
                error: None,
            });
            log::debug!("MISS lane {} at {:.3}", event.lane, event.time);
            return judgement;
        }

        let delta = delta.unwrap_or_default();
        self.score += judgement.points();
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.hit_errors.push(delta);
        self.hit_log.push(HitRecord {
            note_time: event.time,
            lane: event.lane,
            judgement,
            error: Some(delta),
        });

        if event.is_hold() {
            self.states[idx] = NoteState::HeadJudged(judgement);
            if let Some(slot) = self.active_hold.get_mut(event.lane) {
                *slot = Some(idx);
            }
        } else {
            self.states[idx] = NoteState::Hit(judgement);
        }

        log::debug!("{} lane {} ({:+.1} ms)", judgement, event.lane, delta * 1000.0);
        judgement
    }

    /// Shared by releases and the tail sweep.
    fn complete_hold(&mut self, idx: usize, success: bool) {
        let head = match self.states[idx] {
            NoteState::HeadJudged(j) => j,
            _ => return,
        };
        let event = self.events[idx];
        if let Some(slot) = self.active_hold.get_mut(event.lane) {
            *slot = None;
        }

        if success {
            self.states[idx] = NoteState::Completed(head);
            self.score += HOLD_COMPLETION_BONUS;
            log::debug!("HOLD complete lane {}", event.lane);
        } else {
            self.states[idx] = NoteState::Missed;
            self.combo = 0;
            self.counts.record(Judgement::Miss);
            self.hit_log.push(HitRecord {
                note_time: event.time,
                lane: event.lane,
                judgement: Judgement::Miss,
                error: None,
            });
            log::debug!("HOLD released early lane {}", event.lane);
        }
    }
}
