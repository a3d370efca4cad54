use log::{debug, error, info, warn};

use crate::data::bounds::{BoundingBox, compute_bounds};
use crate::data::filter::{FilterState, filtered_indices};
use crate::data::model::{EventDataset, EventRecord, ParseReport, RowRejection};
use crate::data::timeline::{IndexRange, MonthlyHistogram, Timeline};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Where the dataset came from, for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Feed(String),
    File(String),
}

/// Everything derived from one loaded dataset plus the live filter, with no
/// rendering concerns. The render layer reads `visible_indices` and redraws
/// whenever `revision` changes.
pub struct Session {
    /// Loaded dataset (empty until a load succeeds).
    pub dataset: EventDataset,

    /// Rows the parser dropped, with reasons.
    pub rejected: Vec<RowRejection>,

    pub source: Option<Source>,

    /// Padded data bounds, used for the initial viewport.
    pub bounds: Option<BoundingBox>,

    /// How far the viewport may be panned.
    pub pan_limits: Option<BoundingBox>,

    pub timeline: Timeline,
    pub histogram: MonthlyHistogram,

    pub filters: FilterState,

    /// Indices of events passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Bumped every time `visible_indices` is recomputed.
    pub revision: u64,

    /// Event under the pointer, if any.
    pub hovered: Option<usize>,

    /// Set when retrieval failed for good; the session then has no data.
    pub fatal_error: Option<String>,

    /// Non-fatal status / error message shown in the UI.
    pub status_message: Option<String>,

    pan_margin: [f64; 2],
}

impl Session {
    pub fn new(pan_margin: [f64; 2]) -> Self {
        let timeline = Timeline::default();
        Self {
            dataset: EventDataset::default(),
            rejected: Vec::new(),
            source: None,
            bounds: None,
            pan_limits: None,
            filters: FilterState::reset(&timeline),
            timeline,
            histogram: MonthlyHistogram::default(),
            visible_indices: Vec::new(),
            revision: 0,
            hovered: None,
            fatal_error: None,
            status_message: None,
            pan_margin,
        }
    }

    /// Ingest a freshly parsed dataset: derive bounds, timeline and histogram
    /// once, reset the filters, and compute the first view.
    pub fn set_dataset(&mut self, report: ParseReport, source: Source) {
        let dropped = report.dropped();
        let ParseReport { dataset, rejected } = report;

        info!(
            "Loaded {} events ({} rows dropped, {} undated)",
            dataset.len(),
            dropped,
            dataset.undated_count()
        );
        if let Some(first) = rejected.first() {
            warn!("dropped {dropped} rows; first at row {}: {}", first.row, first.reason);
        }

        self.bounds = compute_bounds(&dataset);
        self.pan_limits = self
            .bounds
            .map(|b| b.expanded(self.pan_margin[0], self.pan_margin[1]));
        self.timeline = Timeline::from_dataset(&dataset);
        self.histogram = MonthlyHistogram::build(&dataset, &self.timeline);
        self.filters = FilterState::reset(&self.timeline);
        self.dataset = dataset;
        self.rejected = rejected;
        self.source = Some(source);
        self.hovered = None;
        self.fatal_error = None;
        self.status_message = None;
        self.refilter();
    }

    /// Retrieval failed for good: show it and keep nothing stale around.
    pub fn fail(&mut self, message: String) {
        error!("{message}");
        let margin = self.pan_margin;
        *self = Session::new(margin);
        self.fatal_error = Some(message);
    }

    /// A feed retrieval failed. Fatal only when nothing has been loaded yet;
    /// otherwise the current dataset stays and the failure is reported.
    pub fn fetch_failed(&mut self, message: String) {
        if self.source.is_none() {
            self.fail(message);
        } else {
            error!("{message}");
            self.status_message = Some(format!("Reload failed: {message}"));
        }
    }

    /// Short description of where the current dataset came from.
    pub fn source_label(&self) -> Option<String> {
        self.source.as_ref().map(|source| match source {
            Source::Feed(url) => format!("feed {url}"),
            Source::File(path) => format!("file {path}"),
        })
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.timeline, &self.filters);
        self.revision += 1;
        if let Some(h) = self.hovered {
            if !self.visible_indices.contains(&h) {
                self.hovered = None;
            }
        }
        debug!(
            "filter revision {}: {} of {} visible",
            self.revision,
            self.visible_indices.len(),
            self.dataset.len()
        );
    }

    pub fn visible(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.visible_indices.iter().map(|&i| &self.dataset.events[i])
    }

    // -- control surface --

    pub fn set_mag_min(&mut self, value: f64) {
        self.filters.set_mag_min(value);
        self.refilter();
    }

    pub fn set_mag_max(&mut self, value: f64) {
        self.filters.set_mag_max(value);
        self.refilter();
    }

    pub fn set_depth_min(&mut self, value: f64) {
        self.filters.set_depth_min(value);
        self.refilter();
    }

    pub fn set_depth_max(&mut self, value: f64) {
        self.filters.set_depth_max(value);
        self.refilter();
    }

    pub fn set_induced_only(&mut self, on: bool) {
        self.filters.set_induced_only(on);
        self.refilter();
    }

    pub fn set_time_window(&mut self, start: usize, end: usize) {
        self.filters.set_time_window(start, end);
        self.refilter();
    }

    /// Full ranges, all-time window, induced filter off.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState::reset(&self.timeline);
        self.refilter();
    }

    pub fn time_window(&self) -> IndexRange {
        self.filters.time_window
    }

    pub fn time_label(&self) -> String {
        self.timeline.label(self.filters.time_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_feed;
    use crate::data::model::Induced;

    /// 100 events spread over Jan–Dec 2024 with magnitudes cycling
    /// 0.0..4.9, depths cycling 0..29 and every third event induced.
    fn synthetic_feed() -> String {
        let mut text = String::from("lat,lon,depth,magnitude,induced,location,datetime\n");
        for i in 0..100u32 {
            let month = i % 12 + 1;
            let day = i % 28 + 1;
            let mag = (i % 50) as f64 / 10.0;
            let depth = (i % 30) as f64;
            let induced = match i % 3 {
                0 => "1",
                1 => "0",
                _ => "",
            };
            text.push_str(&format!(
                "{:.3},{:.3},{depth},{mag},{induced},Site {i},2024-{month:02}-{day:02}T12:00:00Z\n",
                50.0 + (i % 10) as f64,
                -6.0 + (i % 8) as f64,
            ));
        }
        text
    }

    fn loaded() -> Session {
        let mut session = Session::new([8.0, 5.0]);
        session.set_dataset(parse_feed(&synthetic_feed()), Source::Feed("test".into()));
        session
    }

    #[test]
    fn load_derives_everything_once() {
        let session = loaded();
        assert_eq!(session.dataset.len(), 100);
        assert!(session.rejected.is_empty());
        assert_eq!(session.timeline.len(), 100);
        assert_eq!(session.histogram.len(), 12);
        assert_eq!(
            session.histogram.buckets.iter().map(|b| b.count).sum::<usize>(),
            100
        );
        assert_eq!(session.visible_indices.len(), 100);
        assert_eq!(session.time_label(), "All Events");

        let bounds = session.bounds.unwrap();
        let limits = session.pan_limits.unwrap();
        assert!((bounds.min_lon - (-6.0 - 7.0 * 0.15)).abs() < 1e-9);
        assert!((limits.min_lon - (bounds.min_lon - 8.0)).abs() < 1e-9);
    }

    #[test]
    fn raising_mag_min_keeps_exactly_the_larger_events() {
        let mut session = loaded();
        session.set_mag_min(3.0);

        let expected: Vec<usize> = session
            .dataset
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.magnitude >= 3.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(session.visible_indices, expected);
        assert_eq!(expected.len(), 40);
    }

    #[test]
    fn every_change_bumps_revision_and_reset_restores_all() {
        let mut session = loaded();
        let start = session.revision;

        session.set_depth_max(9.0);
        session.set_induced_only(true);
        session.set_time_window(60, 10);
        assert_eq!(session.revision, start + 3);
        assert_eq!(session.time_window(), IndexRange::new(10, 60));
        assert!(session.visible().all(|e| e.depth <= 9.0 && e.induced == Induced::Yes));
        assert_ne!(session.time_label(), "All Events");

        session.reset_filters();
        assert_eq!(session.visible_indices.len(), 100);
        assert_eq!(session.time_label(), "All Events");
        assert_eq!(session.revision, start + 4);
    }

    #[test]
    fn hovered_event_cleared_when_filtered_out() {
        let mut session = loaded();
        session.hovered = Some(0);
        session.set_mag_min(1.0);
        assert_eq!(session.hovered, None);
    }

    #[test]
    fn failure_clears_data_and_is_visible() {
        let mut session = loaded();
        session.fail("server returned HTTP 404".into());
        assert!(session.dataset.is_empty());
        assert!(session.visible_indices.is_empty());
        assert_eq!(session.fatal_error.as_deref(), Some("server returned HTTP 404"));
    }

    #[test]
    fn failed_reload_keeps_the_loaded_dataset() {
        let mut session = Session::new([8.0, 5.0]);
        session.set_dataset(parse_feed(&synthetic_feed()), Source::File("quakes.csv".into()));
        session.set_mag_min(3.0);
        let before = session.visible_indices.clone();

        session.fetch_failed("connection failed: refused".into());
        assert_eq!(session.dataset.len(), 100);
        assert_eq!(session.visible_indices, before);
        assert_eq!(session.fatal_error, None);
        assert_eq!(
            session.status_message.as_deref(),
            Some("Reload failed: connection failed: refused")
        );
        assert_eq!(session.source_label().as_deref(), Some("file quakes.csv"));
    }

    #[test]
    fn failed_first_fetch_is_fatal() {
        let mut session = Session::new([8.0, 5.0]);
        assert_eq!(session.source_label(), None);
        session.fetch_failed("server returned HTTP 500".into());
        assert!(session.dataset.is_empty());
        assert_eq!(session.fatal_error.as_deref(), Some("server returned HTTP 500"));
    }

    #[test]
    fn dropped_rows_are_kept_for_diagnostics() {
        let mut text = synthetic_feed();
        text.push_str("oops,1,2,3,,Nowhere,2024-01-01\nshort,row\n");
        let mut session = Session::new([8.0, 5.0]);
        session.set_dataset(parse_feed(&text), Source::File("x.csv".into()));
        assert_eq!(session.dataset.len(), 100);
        assert_eq!(session.rejected.len(), 2);
    }
}
