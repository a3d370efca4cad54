use eframe::egui::{self, Color32, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::state::Session;

const SELECTED_BAR: Color32 = Color32::from_rgb(255, 152, 0);
const UNSELECTED_BAR: Color32 = Color32::from_gray(170);
const AXIS_LABELS: usize = 5;

// ---------------------------------------------------------------------------
// Timeline (bottom panel): monthly histogram + two-handle window
// ---------------------------------------------------------------------------

pub fn timeline_panel(ui: &mut Ui, session: &mut Session) {
    if session.timeline.is_empty() {
        ui.label("No dated events.");
        return;
    }
    let last = session.timeline.len() - 1;

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Timeline");
        ui.label(session.time_label());
    });

    monthly_chart(ui, session);

    let mut window = session.time_window();
    let start_changed = ui
        .add(egui::Slider::new(&mut window.start, 0..=last).text("start"))
        .changed();
    let end_changed = ui
        .add(egui::Slider::new(&mut window.end, 0..=last).text("end"))
        .changed();
    if start_changed || end_changed {
        session.set_time_window(window.start, window.end);
    }
}

fn monthly_chart(ui: &mut Ui, session: &Session) {
    let hist = &session.histogram;
    if hist.is_empty() {
        return;
    }
    let selected = hist.selected_buckets(&session.timeline, session.time_window());

    let bars: Vec<Bar> = hist
        .buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let in_window = selected.as_ref().is_some_and(|r| r.contains(&i));
            Bar::new(i as f64, bucket.count as f64)
                .width(0.9)
                .name(bucket.month_start.format("%b %Y").to_string())
                .fill(if in_window { SELECTED_BAR } else { UNSELECTED_BAR })
        })
        .collect();

    let labels = hist.axis_labels(AXIS_LABELS);
    Plot::new("monthly_histogram")
        .height(110.0)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_x(-0.5)
        .include_x(hist.len() as f64 - 0.5)
        .include_y(0.0)
        .include_y(hist.max_count().max(1) as f64)
        .y_axis_label("Events")
        .x_axis_formatter(move |mark, _range| {
            labels
                .iter()
                .find(|(idx, _)| (*idx as f64 - mark.value).abs() < 1e-6)
                .map(|(_, year)| year.clone())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
