use rand::Rng;

/// Deterministic pseudo-hash of an event time onto a lane
pub fn hash_lane(time: f32, lane_count: usize) -> usize {
    if lane_count == 0 {
        return 0;
    }
    ((time * 97.31).sin().abs() * 10000.0).floor() as usize % lane_count
}

/// Tracks per-lane occupancy while a chart is being built.
pub struct LaneAssigner {
    pub num_lanes: usize,
    pub min_lane_gap: f32, // seconds between events on the same lane
    last_lane_time: Vec<f32>,
    last_lane: Option<usize>,
}

impl LaneAssigner {
    pub fn new(num_lanes: usize, min_lane_gap: f32) -> Self {
        LaneAssigner {
            num_lanes,
            min_lane_gap,
            last_lane_time: vec![f32::NEG_INFINITY; num_lanes],
            last_lane: None,
        }
    }

    /// Whether `lane` is free at `time`
    pub fn is_free(&self, lane: usize, time: f32) -> bool {
        time - self.last_lane_time[lane] >= self.min_lane_gap
    }

    /// Pick a lane for an event at `time`, or `None` when every lane is still blocked.
    ///
    /// The hashed lane is moved off the previous lane, then lanes are scanned
    /// round-robin starting after it until one satisfies the per-lane gap.
    pub fn assign(&self, time: f32) -> Option<usize> {
        if self.num_lanes == 0 {
            return None;
        }

        let mut lane = hash_lane(time, self.num_lanes);
        if Some(lane) == self.last_lane {
            lane = (lane + 1) % self.num_lanes;
        }
        if self.is_free(lane, time) {
            return Some(lane);
        }

        (0..self.num_lanes)
            .map(|tried| (lane + 1 + tried) % self.num_lanes)
            .find(|&alt| self.is_free(alt, time))
    }

    /// Second lane for a chord, uniformly among free lanes other than `base`
    pub fn chord_lane<R: Rng + ?Sized>(&self, time: f32, base: usize, rng: &mut R) -> Option<usize> {
        let candidates: Vec<usize> = (0..self.num_lanes)
            .filter(|&l| l != base && self.is_free(l, time))
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        }
    }

    /// Block `lane` until `until`; `primary` marks it as the lane to steer away from next.
    pub fn occupy(&mut self, lane: usize, until: f32, primary: bool) {
        self.last_lane_time[lane] = until;
        if primary {
            self.last_lane = Some(lane);
        }
    }
}
