use crate::chart::ChartEvent;
use std::collections::{HashSet, VecDeque};

/// Drop every second consecutive off-beat event on the half-beat grid.
///
/// Events are taken in emission order; an on-beat event resets the run.
pub fn reduce_syncopation(events: Vec<ChartEvent>, bpm: u32) -> Vec<ChartEvent> {
    if bpm == 0 {
        return events;
    }

    let q = (60.0 / bpm as f32) / 2.0;
    let mut off_count = 0usize;
    let before = events.len();

    let kept: Vec<ChartEvent> = events
        .into_iter()
        .filter(|e| {
            let off_beat = ((e.time / q).round() as i64).rem_euclid(2) != 0;
            if off_beat {
                off_count += 1;
                off_count % 2 != 0
            } else {
                off_count = 0;
                true
            }
        })
        .collect();

    log::debug!("Syncopation reduction: {} -> {} events", before, kept.len());
    kept
}

/// Timestamps are compared at 10 ms resolution
fn time_key(t: f32) -> i64 {
    (t * 100.0).round() as i64
}

/// Cap the number of distinct timestamps inside any `window_ms` window.
///
/// The newest timestamp that overflows the window is dropped together with
/// every event sharing it.
pub fn smooth_bursts(events: Vec<ChartEvent>, window_ms: f32, limit: usize) -> Vec<ChartEvent> {
    if events.is_empty() || limit == 0 {
        return events;
    }

    let window = (window_ms / 10.0).round() as i64;
    let mut keys: Vec<i64> = events.iter().map(|e| time_key(e.time)).collect();
    keys.sort_unstable();
    keys.dedup();

    let mut drop = HashSet::new();
    let mut recent: VecDeque<i64> = VecDeque::new();
    for key in keys {
        while recent.front().map_or(false, |&front| key - front > window) {
            recent.pop_front();
        }
        recent.push_back(key);
        if recent.len() > limit {
            drop.insert(key);
            recent.pop_back();
        }
    }

    if drop.is_empty() {
        return events;
    }

    log::debug!("Burst smoothing dropped {} timestamps", drop.len());
    events
        .into_iter()
        .filter(|e| !drop.contains(&time_key(e.time)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_off_beats() {
        // 120 BPM: half-beat grid is 0.25 s, odd multiples are off-beat
        let events = vec![
            ChartEvent::tap(0.25, 0),
            ChartEvent::tap(0.75, 1),
            ChartEvent::tap(1.25, 2),
            ChartEvent::tap(1.5, 3),
            ChartEvent::tap(1.75, 4),
        ];
        let kept = reduce_syncopation(events, 120);
        let times: Vec<f32> = kept.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.25, 1.25, 1.5, 1.75]);
    }

    #[test]
    fn test_on_beat_events_survive() {
        let events: Vec<ChartEvent> = (0..8).map(|k| ChartEvent::tap(k as f32 * 0.5, 0)).collect();
        assert_eq!(reduce_syncopation(events.clone(), 120), events);
    }

    #[test]
    fn test_burst_drops_overflow_timestamp() {
        let events = vec![
            ChartEvent::tap(1.00, 0),
            ChartEvent::tap(1.10, 1),
            ChartEvent::tap(1.20, 2),
            ChartEvent::tap(1.20, 4),
            ChartEvent::tap(1.60, 3),
        ];
        let kept = smooth_bursts(events, 320.0, 2);
        let times: Vec<f32> = kept.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1.00, 1.10, 1.60]);
    }

    #[test]
    fn test_burst_within_limit_untouched() {
        let events: Vec<ChartEvent> = (0..10).map(|k| ChartEvent::tap(k as f32 * 0.3, k % 4)).collect();
        assert_eq!(smooth_bursts(events.clone(), 240.0, 3), events);
    }
}
