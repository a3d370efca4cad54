use std::time::Duration;

use eframe::egui;

use crate::config::AppConfig;
use crate::data::loader::parse_feed;
use crate::fetch::{FeedTask, FetchError};
use crate::state::{Session, Source};
use crate::ui::panels::{self, MenuAction};
use crate::ui::{plot, table, timeline};

/// How often to repaint while a retrieval is in flight.
const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct QuakeViewApp {
    pub session: Session,
    config: AppConfig,
    pending: Option<FeedTask>,
    show_table: bool,
    reset_view: bool,
}

impl QuakeViewApp {
    /// Build the app and start fetching the configured feed.
    pub fn new(config: AppConfig) -> Self {
        let mut app = Self {
            session: Session::new(config.pan_margin),
            config,
            pending: None,
            show_table: false,
            reset_view: true,
        };
        app.load_feed();
        app
    }

    /// Start a background retrieval of the feed, unless one is running.
    pub fn load_feed(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let url = self.config.feed_url.clone();
        log::info!("Loading events from {url}");
        self.pending = Some(FeedTask::fetch(url, self.config.fetch.clone()));
    }

    fn poll_feed(&mut self) {
        let Some(result) = self.pending.as_ref().and_then(FeedTask::poll) else {
            return;
        };
        if let Some(task) = self.pending.take() {
            self.finish_feed(task.url().to_string(), result);
        }
    }

    fn finish_feed(&mut self, url: String, result: Result<String, FetchError>) {
        match result {
            Ok(text) => {
                self.session.set_dataset(parse_feed(&text), Source::Feed(url));
                self.reset_view = true;
            }
            Err(e) => self.session.fetch_failed(format!("fetching {url}: {e}")),
        }
    }

    fn apply(&mut self, action: Option<MenuAction>) {
        match action {
            Some(MenuAction::ReloadFeed) => self.load_feed(),
            Some(MenuAction::ResetView) => self.reset_view = true,
            Some(MenuAction::ToggleTable) => self.show_table = !self.show_table,
            None => {}
        }
    }
}

impl eframe::App for QuakeViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_feed();
        let loading = self.pending.is_some();
        if loading {
            ctx.request_repaint_after(FETCH_POLL_INTERVAL);
        }

        // ---- Top panel: menu bar ----
        let action = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| {
                panels::top_bar(ui, &mut self.session, self.show_table, loading)
            })
            .inner;
        self.apply(action);

        // ---- Left side panel: filters ----
        let action = egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| panels::side_panel(ui, &mut self.session))
            .inner;
        self.apply(action);

        // ---- Right side panel: event table ----
        if self.show_table {
            egui::SidePanel::right("event_table")
                .default_width(420.0)
                .resizable(true)
                .show(ctx, |ui| table::events_table(ui, &self.session));
        }

        // ---- Bottom panel: timeline ----
        egui::TopBottomPanel::bottom("timeline")
            .resizable(false)
            .show(ctx, |ui| timeline::timeline_panel(ui, &mut self.session));

        // ---- Central panel: map ----
        let reset_view = std::mem::take(&mut self.reset_view);
        egui::CentralPanel::default().show(ctx, |ui| {
            if loading && self.session.dataset.is_empty() {
                ui.centered_and_justified(|ui: &mut egui::Ui| {
                    ui.spinner();
                });
            } else {
                plot::event_map(ui, &mut self.session, reset_view);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(task: FeedTask) -> QuakeViewApp {
        QuakeViewApp {
            session: Session::new([8.0, 5.0]),
            config: AppConfig::default(),
            pending: Some(task),
            show_table: false,
            reset_view: false,
        }
    }

    fn poll_until_done(app: &mut QuakeViewApp) {
        for _ in 0..500 {
            app.poll_feed();
            if app.pending.is_none() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("feed task did not finish");
    }

    const FEED: &str = "lat,lon,depth,magnitude,induced,location,datetime\n\
                        55.1,-3.2,10,2.3,0,Glasgow,2024-01-05\n\
                        54.0,-2.0,3,1.1,1,Kendal,2024-02-01\n";

    #[test]
    fn finished_fetch_is_loaded_into_the_session() {
        let mut app = app_with(FeedTask::spawn("feed-url".into(), |_| Ok(FEED.to_string())));
        poll_until_done(&mut app);

        assert_eq!(app.session.dataset.len(), 2);
        assert_eq!(app.session.source, Some(Source::Feed("feed-url".into())));
        assert!(app.reset_view);
    }

    #[test]
    fn failed_reload_leaves_loaded_events_alone() {
        let mut app = app_with(FeedTask::spawn("first".into(), |_| Ok(FEED.to_string())));
        poll_until_done(&mut app);

        app.pending = Some(FeedTask::spawn("again".into(), |_| Err(FetchError::Timeout)));
        poll_until_done(&mut app);

        assert_eq!(app.session.dataset.len(), 2);
        assert_eq!(app.session.fatal_error, None);
        assert_eq!(
            app.session.status_message.as_deref(),
            Some("Reload failed: fetching again: request timed out")
        );
    }

    #[test]
    fn reload_is_ignored_while_a_fetch_is_running() {
        let (release, gate) = std::sync::mpsc::channel::<()>();
        let mut app = app_with(FeedTask::spawn("slow".into(), move |_| {
            gate.recv().map_err(|e| FetchError::Other(e.to_string()))?;
            Ok(FEED.to_string())
        }));

        app.apply(Some(MenuAction::ReloadFeed));
        assert_eq!(app.pending.as_ref().map(FeedTask::url), Some("slow"));

        release.send(()).unwrap();
        poll_until_done(&mut app);
        assert_eq!(app.session.dataset.len(), 2);
    }
}
