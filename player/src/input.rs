use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys for each lane, left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub lanes: Vec<char>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            lanes: vec!['S', 'D', 'F', 'J', 'K', 'L'],
        }
    }
}

impl KeyBindings {
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Map a key to its lane, case-insensitively
    pub fn key_to_lane(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_uppercase();
        self.lanes.iter().position(|k| k.to_ascii_uppercase() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Press,
    Release,
}

/// One lane input on the play clock, as stored in replay logs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub lane: usize,
    pub timestamp: f32, // seconds
    pub kind: InputKind,
}

impl InputEvent {
    pub fn press(lane: usize, timestamp: f32) -> Self {
        Self {
            lane,
            timestamp,
            kind: InputKind::Press,
        }
    }

    pub fn release(lane: usize, timestamp: f32) -> Self {
        Self {
            lane,
            timestamp,
            kind: InputKind::Release,
        }
    }
}

/// Turns raw key presses into lane events on the play clock.
pub struct InputHandler {
    bindings: KeyBindings,
    offset_ms: f32, // positive shifts input later
    held: HashSet<usize>,
}

impl InputHandler {
    pub fn new(bindings: KeyBindings, offset_ms: f32) -> Self {
        Self {
            bindings,
            offset_ms,
            held: HashSet::new(),
        }
    }

    pub fn with_default_bindings() -> Self {
        Self::new(KeyBindings::default(), 0.0)
    }

    fn adjusted(&self, time: f32) -> f32 {
        time + self.offset_ms / 1000.0
    }

    /// Key auto-repeat while held yields nothing
    pub fn handle_key_press(&mut self, key: char, time: f32) -> Option<InputEvent> {
        let lane = self.bindings.key_to_lane(key)?;
        if !self.held.insert(lane) {
            return None;
        }
        Some(InputEvent::press(lane, self.adjusted(time)))
    }

    pub fn handle_key_release(&mut self, key: char, time: f32) -> Option<InputEvent> {
        let lane = self.bindings.key_to_lane(key)?;
        if !self.held.remove(&lane) {
            return None;
        }
        Some(InputEvent::release(lane, self.adjusted(time)))
    }

    /// Feed a recorded lane event through the offset and held-lane tracking.
    ///
    /// A press on an already held lane or a release of a free one yields nothing.
    pub fn handle_lane_event(&mut self, event: InputEvent) -> Option<InputEvent> {
        let changed = match event.kind {
            InputKind::Press => self.held.insert(event.lane),
            InputKind::Release => self.held.remove(&event.lane),
        };
        if !changed {
            return None;
        }
        Some(InputEvent {
            timestamp: self.adjusted(event.timestamp),
            ..event
        })
    }

    pub fn is_lane_pressed(&self, lane: usize) -> bool {
        self.held.contains(&lane)
    }
}
