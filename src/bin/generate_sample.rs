use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, TimeZone, Utc};
use parquet::arrow::ArrowWriter;

const N_EVENTS: usize = 600;

/// Rough activity centres: (name, lat, lon, spread in degrees).
const REGIONS: [(&str, f64, f64, f64); 6] = [
    ("Ochil Hills, Clackmannanshire", 56.17, -3.75, 0.25),
    ("Lleyn Peninsula, Gwynedd", 52.88, -4.45, 0.30),
    ("Preston New Road, Lancashire", 53.79, -2.95, 0.05),
    ("Dudley, West Midlands", 52.51, -2.09, 0.20),
    ("North Sea", 55.90, 1.90, 1.20),
    ("Great Glen, Highland", 57.20, -4.75, 0.50),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Exponential with the given mean; small events dominate like a
    /// Gutenberg–Richter tail.
    fn exponential(&mut self, mean: f64) -> f64 {
        -mean * (1.0 - self.next_f64()).max(1e-15).ln()
    }
}

struct Event {
    lat: f64,
    lon: f64,
    depth: f64,
    magnitude: f64,
    induced: Option<f64>,
    location: String,
    datetime: String,
}

fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

fn generate(rng: &mut SimpleRng) -> Vec<Event> {
    let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
    let span_secs = 6 * 365 * 24 * 3600;

    let mut events: Vec<Event> = (0..N_EVENTS)
        .map(|_| {
            let (name, lat, lon, spread) = REGIONS[(rng.next_u64() % REGIONS.len() as u64) as usize];
            let fracking = name.starts_with("Preston");
            let induced = match rng.next_u64() % 10 {
                0..=5 => Some(if fracking { 1.0 } else { 0.0 }),
                6 | 7 => Some(if rng.next_f64() < 0.1 { 1.0 } else { 0.0 }),
                _ => None,
            };
            let when = start + Duration::seconds((rng.next_f64() * span_secs as f64) as i64);
            Event {
                lat: round_to(lat + rng.uniform(-spread, spread), 3),
                lon: round_to(lon + rng.uniform(-spread, spread), 3),
                depth: round_to(if fracking { rng.uniform(1.0, 3.0) } else { rng.exponential(8.0) }, 1),
                magnitude: round_to(rng.exponential(0.9).min(5.9), 1),
                induced,
                location: name.to_string(),
                datetime: when.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            }
        })
        .collect();

    events.sort_by(|a, b| a.datetime.cmp(&b.datetime));
    events
}

fn write_csv(path: &str, events: &[Event]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    writer
        .write_record(["lat", "lon", "depth", "magnitude", "induced", "location", "datetime"])
        .expect("Failed to write header");
    for ev in events {
        writer
            .write_record([
                ev.lat.to_string(),
                ev.lon.to_string(),
                ev.depth.to_string(),
                ev.magnitude.to_string(),
                ev.induced.map(|v| v.to_string()).unwrap_or_default(),
                ev.location.clone(),
                ev.datetime.clone(),
            ])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(path: &str, events: &[Event]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("depth", DataType::Float64, false),
        Field::new("magnitude", DataType::Float64, false),
        Field::new("induced", DataType::Float64, true),
        Field::new("location", DataType::Utf8, false),
        Field::new("datetime", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from_iter_values(events.iter().map(|e| e.lat))),
            Arc::new(Float64Array::from_iter_values(events.iter().map(|e| e.lon))),
            Arc::new(Float64Array::from_iter_values(events.iter().map(|e| e.depth))),
            Arc::new(Float64Array::from_iter_values(events.iter().map(|e| e.magnitude))),
            Arc::new(Float64Array::from(
                events.iter().map(|e| e.induced).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                events.iter().map(|e| e.location.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                events.iter().map(|e| e.datetime.as_str()).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let events = generate(&mut rng);

    write_csv("sample_quakes.csv", &events);
    write_parquet("sample_quakes.parquet", &events);

    println!(
        "Wrote {} events to sample_quakes.csv and sample_quakes.parquet",
        events.len()
    );
}
