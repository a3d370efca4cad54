use eframe::egui::Color32;
use palette::Srgba;

/// Fill alpha shared by every depth colour.
pub const FILL_ALPHA: u8 = 200;

type Rgb = (u8, u8, u8);

const SHALLOW: Rgb = (255, 235, 59);
const MID: Rgb = (255, 152, 0);
const MID_DEEP: Rgb = (255, 87, 34);
const DEEP: Rgb = (183, 28, 28);

fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    let (from, to) = (f64::from(from), f64::from(to));
    (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
}

fn lerp_rgb(from: Rgb, to: Rgb, t: f64) -> Rgb {
    (
        lerp_channel(from.0, to.0, t),
        lerp_channel(from.1, to.1, t),
        lerp_channel(from.2, to.2, t),
    )
}

// ---------------------------------------------------------------------------
// Depth → fill colour
// ---------------------------------------------------------------------------

/// Piecewise-linear depth colour:
///
/// | depth (km) | colour                                    |
/// |------------|-------------------------------------------|
/// | `< 5`      | yellow `(255, 235, 59)`                   |
/// | `5..10`    | green `235 → 152`, blue `59 → 0`          |
/// | `10..20`   | green `152 → 87`, blue `0 → 34`           |
/// | `>= 20`    | dark red `(183, 28, 28)`                  |
pub fn depth_to_color(depth: f64) -> Srgba<u8> {
    let (r, g, b) = if depth < 5.0 {
        SHALLOW
    } else if depth < 10.0 {
        lerp_rgb(SHALLOW, MID, (depth - 5.0) / 5.0)
    } else if depth < 20.0 {
        lerp_rgb(MID, MID_DEEP, (depth - 10.0) / 10.0)
    } else {
        DEEP
    };
    Srgba::new(r, g, b, FILL_ALPHA)
}

// ---------------------------------------------------------------------------
// Magnitude → radius
// ---------------------------------------------------------------------------

/// Point radius in pixels. Negative magnitudes count as zero.
pub fn mag_to_radius(magnitude: f64) -> f32 {
    let m = magnitude.max(0.0);
    if m < 1.0 {
        4.0
    } else if m < 2.0 {
        6.0
    } else if m < 3.0 {
        8.0
    } else {
        10.0
    }
}

pub fn to_color32(c: Srgba<u8>) -> Color32 {
    Color32::from_rgba_unmultiplied(c.red, c.green, c.blue, c.alpha)
}

/// Legend entries (label → colour at the band's lower edge).
pub fn depth_legend() -> Vec<(&'static str, Srgba<u8>)> {
    vec![
        ("< 5 km", depth_to_color(0.0)),
        ("5–10 km", depth_to_color(5.0)),
        ("10–20 km", depth_to_color(10.0)),
        ("≥ 20 km", depth_to_color(20.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(c: Srgba<u8>) -> (u8, u8, u8, u8) {
        (c.red, c.green, c.blue, c.alpha)
    }

    #[test]
    fn depth_band_endpoints() {
        assert_eq!(rgba(depth_to_color(0.0)), (255, 235, 59, 200));
        assert_eq!(rgba(depth_to_color(4.99)), (255, 235, 59, 200));
        assert_eq!(rgba(depth_to_color(5.0)), (255, 235, 59, 200));
        assert_eq!(rgba(depth_to_color(10.0)), (255, 152, 0, 200));
        assert_eq!(rgba(depth_to_color(20.0)), (183, 28, 28, 200));
        assert_eq!(rgba(depth_to_color(25.0)), (183, 28, 28, 200));
    }

    #[test]
    fn depth_interpolates_within_bands() {
        // Midpoint of 5–10: 235 - 83/2 = 193.5, 59 - 59/2 = 29.5, both round up.
        assert_eq!(rgba(depth_to_color(7.5)), (255, 194, 30, 200));
        // Midpoint of 10–20: 152 - 65/2 = 119.5, 34/2 = 17.
        assert_eq!(rgba(depth_to_color(15.0)), (255, 120, 17, 200));
        assert_eq!(rgba(depth_to_color(19.999)), (255, 87, 34, 200));
    }

    #[test]
    fn negative_depth_is_shallow() {
        assert_eq!(rgba(depth_to_color(-3.0)), (255, 235, 59, 200));
    }

    #[test]
    fn magnitude_steps() {
        assert_eq!(mag_to_radius(-1.0), 4.0);
        assert_eq!(mag_to_radius(0.9), 4.0);
        assert_eq!(mag_to_radius(1.0), 6.0);
        assert_eq!(mag_to_radius(2.5), 8.0);
        assert_eq!(mag_to_radius(3.0), 10.0);
        assert_eq!(mag_to_radius(9.0), 10.0);
    }

    #[test]
    fn legend_covers_four_bands() {
        let legend = depth_legend();
        assert_eq!(legend.len(), 4);
        assert_eq!(rgba(legend[3].1), (183, 28, 28, 200));
    }
}
