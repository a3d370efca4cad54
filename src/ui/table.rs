use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::state::Session;

const COLUMNS: [&str; 6] = ["Time", "Magnitude", "Depth (km)", "Induced", "Lat, Lon", "Location"];

/// Visible events in dataset order; the hovered one is highlighted.
pub fn events_table(ui: &mut Ui, session: &Session) {
    ui.strong(format!("{} visible events", session.visible_indices.len()));
    ui.separator();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, session.visible_indices.len(), |mut row| {
                let idx = session.visible_indices[row.index()];
                let ev = &session.dataset.events[idx];
                row.set_selected(session.hovered == Some(idx));
                row.col(|ui: &mut Ui| {
                    ui.label(&ev.timestamp);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.1}", ev.magnitude));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.1}", ev.depth));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(ev.induced.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.3}, {:.3}", ev.latitude, ev.longitude));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&ev.location);
                });
            });
        });
}
