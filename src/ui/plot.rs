use std::collections::BTreeMap;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotPoint, PlotPoints, Points};

use crate::color::{depth_to_color, mag_to_radius};
use crate::data::bounds::BoundingBox;
use crate::data::model::EventRecord;
use crate::state::Session;

/// Hover pick distance in screen pixels.
const PICK_RADIUS: f32 = 10.0;
/// Smallest initial view span in degrees, for single-point datasets.
const MIN_VIEW_SPAN: f64 = 0.5;

// ---------------------------------------------------------------------------
// Event map (central panel)
// ---------------------------------------------------------------------------

/// Render visible events as lon/lat points. `reset_view` snaps the view
/// back to the padded data bounds.
pub fn event_map(ui: &mut Ui, session: &mut Session, reset_view: bool) {
    if let Some(msg) = &session.fatal_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(RichText::new(format!("Could not load events: {msg}")).strong());
        });
        return;
    }
    if session.dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view events  (File → Open…)");
        });
        return;
    }

    // One series per (colour, radius) so thousands of events stay cheap.
    let mut series: BTreeMap<([u8; 4], u32), Vec<[f64; 2]>> = BTreeMap::new();
    for ev in session.visible() {
        let c = depth_to_color(ev.depth);
        let key = ([c.red, c.green, c.blue, c.alpha], mag_to_radius(ev.magnitude) as u32);
        series.entry(key).or_default().push(ev.position());
    }

    let initial_view = session.bounds.map(min_span_view);
    let pan_limits = session.pan_limits;

    let response = Plot::new("event_map")
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if reset_view {
                if let Some(view) = initial_view {
                    plot_ui.set_plot_bounds(view);
                }
            } else if let Some(limits) = pan_limits {
                let current = plot_ui.plot_bounds();
                if let Some((min, max)) = clamp_view(current.min(), current.max(), &limits) {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
                }
            }

            for (([r, g, b, a], radius), points) in series {
                let color = Color32::from_rgba_unmultiplied(r, g, b, a);
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(radius as f32)
                        .color(color),
                );
            }
        });

    session.hovered = response.response.hover_pos().and_then(|pos| {
        nearest_visible(session, |ev| {
            response
                .transform
                .position_from_point(&PlotPoint::new(ev.longitude, ev.latitude))
                .distance(pos)
        })
    });

    if let Some(idx) = session.hovered {
        let ev = &session.dataset.events[idx];
        response.response.on_hover_ui_at_pointer(|ui: &mut Ui| event_tooltip(ui, ev));
    }
}

/// Closest visible event within [`PICK_RADIUS`] pixels.
fn nearest_visible(session: &Session, distance: impl Fn(&EventRecord) -> f32) -> Option<usize> {
    session
        .visible_indices
        .iter()
        .map(|&i| (i, distance(&session.dataset.events[i])))
        .filter(|(_, d)| *d <= PICK_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

pub fn event_tooltip(ui: &mut Ui, ev: &EventRecord) {
    let location = if ev.location.is_empty() {
        "Unknown location"
    } else {
        ev.location.as_str()
    };
    ui.strong(location);
    ui.weak(&ev.timestamp);
    ui.separator();
    ui.label(format!("Magnitude: {:.1}", ev.magnitude));
    ui.label(format!("Depth (km): {:.1}", ev.depth));
    ui.label(format!("Induced: {}", ev.induced));
}

fn min_span_view(b: BoundingBox) -> PlotBounds {
    let [cx, cy] = b.center();
    let half_w = b.lon_span().max(MIN_VIEW_SPAN) / 2.0;
    let half_h = b.lat_span().max(MIN_VIEW_SPAN) / 2.0;
    PlotBounds::from_min_max([cx - half_w, cy - half_h], [cx + half_w, cy + half_h])
}

/// Shift a view back inside the pan limits, per axis. A view wider than the
/// limits is centred on them. `None` when no change is needed.
pub fn clamp_view(
    min: [f64; 2],
    max: [f64; 2],
    limits: &BoundingBox,
) -> Option<([f64; 2], [f64; 2])> {
    let lo = [limits.min_lon, limits.min_lat];
    let hi = [limits.max_lon, limits.max_lat];
    let mut new_min = min;
    let mut new_max = max;

    for axis in 0..2 {
        let width = max[axis] - min[axis];
        let shift = if width >= hi[axis] - lo[axis] {
            (lo[axis] + hi[axis]) / 2.0 - (min[axis] + max[axis]) / 2.0
        } else if min[axis] < lo[axis] {
            lo[axis] - min[axis]
        } else if max[axis] > hi[axis] {
            hi[axis] - max[axis]
        } else {
            0.0
        };
        new_min[axis] += shift;
        new_max[axis] += shift;
    }

    let moved = (0..2).any(|a| (new_min[a] - min[a]).abs() > 1e-9);
    moved.then_some((new_min, new_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: BoundingBox = BoundingBox {
        min_lon: -14.0,
        min_lat: 45.0,
        max_lon: 10.0,
        max_lat: 65.0,
    };

    #[test]
    fn view_inside_limits_is_left_alone() {
        assert_eq!(clamp_view([-5.0, 50.0], [0.0, 55.0], &LIMITS), None);
    }

    #[test]
    fn view_panned_past_edge_is_pulled_back() {
        let (min, max) = clamp_view([-20.0, 50.0], [-10.0, 55.0], &LIMITS).unwrap();
        assert_eq!(min, [-14.0, 50.0]);
        assert_eq!(max, [-4.0, 55.0]);

        let (min, max) = clamp_view([0.0, 62.0], [5.0, 70.0], &LIMITS).unwrap();
        assert_eq!(min, [0.0, 57.0]);
        assert_eq!(max, [5.0, 65.0]);
    }

    #[test]
    fn oversized_view_is_centred() {
        let (min, max) = clamp_view([-40.0, 40.0], [20.0, 60.0], &LIMITS).unwrap();
        assert_eq!(min, [-32.0, 45.0]);
        assert_eq!(max, [28.0, 65.0]);
    }
}
