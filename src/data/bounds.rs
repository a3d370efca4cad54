use super::model::EventDataset;

/// Fraction of each axis span added to both ends of that axis.
pub const BOUNDS_PADDING: f64 = 0.15;

/// A geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Tight box around every event, or `None` for an empty dataset.
    pub fn enclosing(dataset: &EventDataset) -> Option<Self> {
        let first = dataset.events.first()?;
        let init = BoundingBox {
            min_lon: first.longitude,
            min_lat: first.latitude,
            max_lon: first.longitude,
            max_lat: first.latitude,
        };
        Some(dataset.events.iter().fold(init, |b, ev| BoundingBox {
            min_lon: b.min_lon.min(ev.longitude),
            min_lat: b.min_lat.min(ev.latitude),
            max_lon: b.max_lon.max(ev.longitude),
            max_lat: b.max_lat.max(ev.latitude),
        }))
    }

    /// Grow each axis by `fraction` of its own span on both ends. A zero
    /// span stays zero.
    pub fn padded(&self, fraction: f64) -> Self {
        let lon_pad = self.lon_span() * fraction;
        let lat_pad = self.lat_span() * fraction;
        self.expanded(lon_pad, lat_pad)
    }

    /// Grow by fixed margins in degrees.
    pub fn expanded(&self, lon_margin: f64, lat_margin: f64) -> Self {
        BoundingBox {
            min_lon: self.min_lon - lon_margin,
            min_lat: self.min_lat - lat_margin,
            max_lon: self.max_lon + lon_margin,
            max_lat: self.max_lat + lat_margin,
        }
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        ]
    }
}

/// Padded viewport box for a dataset. `None` when there is nothing to bound.
pub fn compute_bounds(dataset: &EventDataset) -> Option<BoundingBox> {
    BoundingBox::enclosing(dataset).map(|b| b.padded(BOUNDS_PADDING))
}
