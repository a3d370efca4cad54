use super::model::{EventDataset, EventRecord, Induced};
use super::timeline::{IndexRange, Timeline};

/// Full extent of the magnitude slider.
pub const MAGNITUDE_RANGE: (f64, f64) = (0.0, 6.0);
/// Full extent of the depth slider, km.
pub const DEPTH_RANGE: (f64, f64) = (0.0, 30.0);

// ---------------------------------------------------------------------------
// Filter predicate state
// ---------------------------------------------------------------------------

/// The five interactive controls, flattened. The predicate assumes
/// `mag_min <= mag_max` and `depth_min <= depth_max`; the setters below keep
/// that true at the control boundary. Crossed time handles are tolerated and
/// swapped when the filter runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub mag_min: f64,
    pub mag_max: f64,
    pub depth_min: f64,
    pub depth_max: f64,
    pub induced_only: bool,
    pub time_window: IndexRange,
}

impl FilterState {
    /// Everything visible: `{0, 6, 0, 30, false, 0, len-1}`.
    pub fn reset(timeline: &Timeline) -> Self {
        FilterState {
            mag_min: MAGNITUDE_RANGE.0,
            mag_max: MAGNITUDE_RANGE.1,
            depth_min: DEPTH_RANGE.0,
            depth_max: DEPTH_RANGE.1,
            induced_only: false,
            time_window: timeline.full_range().unwrap_or(IndexRange::new(0, 0)),
        }
    }

    /// Raising the lower handle past the upper one pins it to the upper one.
    pub fn set_mag_min(&mut self, value: f64) {
        self.mag_min = value.min(self.mag_max);
    }

    pub fn set_mag_max(&mut self, value: f64) {
        self.mag_max = value.max(self.mag_min);
    }

    pub fn set_depth_min(&mut self, value: f64) {
        self.depth_min = value.min(self.depth_max);
    }

    pub fn set_depth_max(&mut self, value: f64) {
        self.depth_max = value.max(self.depth_min);
    }

    pub fn set_induced_only(&mut self, on: bool) {
        self.induced_only = on;
    }

    /// Store the handles normalized so the control reflects the swap.
    pub fn set_time_window(&mut self, start: usize, end: usize) {
        self.time_window = IndexRange::new(start, end).normalized();
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// The combined predicate with the time window already resolved to instants.
struct Predicate {
    state: FilterState,
    window: Option<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>,
}

impl Predicate {
    fn new(state: &FilterState, timeline: &Timeline) -> Self {
        Predicate {
            state: *state,
            window: timeline.window(state.time_window),
        }
    }

    fn accepts(&self, ev: &EventRecord) -> bool {
        let s = &self.state;
        if !(ev.magnitude >= s.mag_min && ev.magnitude <= s.mag_max) {
            return false;
        }
        if !(ev.depth >= s.depth_min && ev.depth <= s.depth_max) {
            return false;
        }
        if s.induced_only && ev.induced != Induced::Yes {
            return false;
        }
        // Undated events are outside every window.
        match (ev.occurred_at, self.window) {
            (Some(t), Some((start, end))) => t >= start && t <= end,
            _ => false,
        }
    }
}

/// Return indices of events that pass every predicate, in dataset order.
///
/// Always a full O(n) pass; nothing is carried over from previous calls.
pub fn filtered_indices(
    dataset: &EventDataset,
    timeline: &Timeline,
    state: &FilterState,
) -> Vec<usize> {
    let predicate = Predicate::new(state, timeline);
    dataset
        .events
        .iter()
        .enumerate()
        .filter(|(_, ev)| predicate.accepts(ev))
        .map(|(i, _)| i)
        .collect()
}
