use eframe::egui::{self, Color32, RichText, ScrollArea, Sense, Ui};

use crate::color::{depth_legend, to_color32};
use crate::data::filter::{DEPTH_RANGE, MAGNITUDE_RANGE};
use crate::state::{Session, Source};
use crate::ui::plot::event_tooltip;

/// Requests from the menu that need more than the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ReloadFeed,
    ResetView,
    ToggleTable,
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, session: &mut Session) -> Option<MenuAction> {
    ui.heading("Filters");
    ui.separator();

    if session.dataset.is_empty() {
        ui.label("No dataset loaded.");
        return None;
    }

    let mut action = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Magnitude ----
            let f = session.filters;
            ui.strong(format!("Magnitude  {:.1} – {:.1}", f.mag_min, f.mag_max));
            let (mut lo, mut hi) = (f.mag_min, f.mag_max);
            let range = MAGNITUDE_RANGE.0..=MAGNITUDE_RANGE.1;
            if ui
                .add(egui::Slider::new(&mut lo, range.clone()).step_by(0.1).text("min"))
                .changed()
            {
                session.set_mag_min(lo);
            }
            if ui
                .add(egui::Slider::new(&mut hi, range).step_by(0.1).text("max"))
                .changed()
            {
                session.set_mag_max(hi);
            }
            ui.separator();

            // ---- Depth ----
            let f = session.filters;
            ui.strong(format!("Depth (km)  {:.0} – {:.0}", f.depth_min, f.depth_max));
            let (mut lo, mut hi) = (f.depth_min, f.depth_max);
            let range = DEPTH_RANGE.0..=DEPTH_RANGE.1;
            if ui
                .add(egui::Slider::new(&mut lo, range.clone()).step_by(1.0).text("min"))
                .changed()
            {
                session.set_depth_min(lo);
            }
            if ui
                .add(egui::Slider::new(&mut hi, range).step_by(1.0).text("max"))
                .changed()
            {
                session.set_depth_max(hi);
            }
            ui.separator();

            // ---- Induced ----
            let mut induced_only = session.filters.induced_only;
            if ui.checkbox(&mut induced_only, "Induced events only").changed() {
                session.set_induced_only(induced_only);
            }
            ui.separator();

            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Reset filters").clicked() {
                    session.reset_filters();
                }
                if ui.button("Reset view").clicked() {
                    action = Some(MenuAction::ResetView);
                }
            });
            ui.separator();

            // ---- Legend ----
            ui.strong("Depth");
            for (label, color) in depth_legend() {
                ui.horizontal(|ui: &mut Ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
                    ui.painter().circle_filled(rect.center(), 6.0, to_color32(color));
                    ui.label(label);
                });
            }
            ui.weak("Point size grows with magnitude.");
            ui.separator();

            // ---- Hovered event ----
            if let Some(idx) = session.hovered {
                event_tooltip(ui, &session.dataset.events[idx]);
            }
        });
    action
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar. `loading` is set while the feed is being
/// retrieved in the background.
pub fn top_bar(
    ui: &mut Ui,
    session: &mut Session,
    show_table: bool,
    loading: bool,
) -> Option<MenuAction> {
    let mut action = None;
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(session);
                ui.close_menu();
            }
            if ui
                .add_enabled(!loading, egui::Button::new("Reload feed"))
                .clicked()
            {
                action = Some(MenuAction::ReloadFeed);
                ui.close_menu();
            }
            let can_export = !session.visible_indices.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export visible…"))
                .clicked()
            {
                export_dialog(session);
                ui.close_menu();
            }
        });

        ui.separator();

        if loading {
            ui.spinner();
            ui.label("Loading feed…");
            ui.separator();
        }

        if let Some(source) = session.source_label() {
            ui.label(format!(
                "{} events loaded from {source}, {} visible",
                session.dataset.len(),
                session.visible_indices.len()
            ));
            let dropped = session.rejected.len();
            if dropped > 0 {
                ui.label(
                    RichText::new(format!("{dropped} rows dropped"))
                        .color(Color32::YELLOW),
                )
                .on_hover_ui(|ui: &mut Ui| {
                    for r in session.rejected.iter().take(20) {
                        ui.label(format!("row {}: {}", r.row, r.reason));
                    }
                });
            }
        }

        ui.separator();

        if ui.selectable_label(show_table, "Event table").clicked() {
            action = Some(MenuAction::ToggleTable);
        }

        if let Some(msg) = session.fatal_error.as_ref().or(session.status_message.as_ref()) {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
    action
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(session: &mut Session) {
    let file = rfd::FileDialog::new()
        .set_title("Open event data")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(report) => {
                session.set_dataset(report, Source::File(path.display().to_string()));
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                session.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_dialog(session: &mut Session) {
    let file = rfd::FileDialog::new()
        .set_title("Export visible events")
        .set_file_name("visible_events.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match crate::data::loader::export_csv(&path, session.visible()) {
            Ok(n) => {
                log::info!("Exported {n} events to {}", path.display());
                session.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                session.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
