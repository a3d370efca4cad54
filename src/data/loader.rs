use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::{DataType, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{
    EventDataset, EventRecord, Induced, ParseReport, RejectReason, RowRejection,
};

/// A feed row needs lat, lon, depth, magnitude, induced, at least one
/// location field and the timestamp.
pub const MIN_FIELDS: usize = 7;

/// Column order used by the feed and by [`export_csv`].
pub const FEED_HEADER: [&str; 7] = [
    "lat",
    "lon",
    "depth",
    "magnitude",
    "induced",
    "location",
    "datetime",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse feed text (header line, then comma-separated rows) into a dataset.
///
/// Rows are never fatal: blank lines are skipped, anything else that cannot
/// be admitted is reported in [`ParseReport::rejected`].
pub fn parse_feed(text: &str) -> ParseReport {
    // Quotes are not field delimiters in this feed; a quoted location that
    // contains commas is split and rejoined like any other.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let mut events = Vec::new();
    let mut rejected = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let row = e.position().map(|p| p.line()).unwrap_or(0);
                rejected.push(RowRejection {
                    row,
                    reason: RejectReason::Malformed(e.to_string()),
                });
                continue;
            }
        };
        let row = record.position().map(|p| p.line()).unwrap_or(0);

        // Whitespace-only line. A row of empty fields is not blank and is
        // rejected below.
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.iter().collect();
        match admit_fields(&fields) {
            Ok(event) => events.push(event),
            Err(reason) => rejected.push(RowRejection { row, reason }),
        }
    }

    ParseReport {
        dataset: EventDataset::from_events(events),
        rejected,
    }
}

/// Load an event table from a local file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – same row layout as the HTTP feed
/// * `.json`    – `[{ "lat": .., "lon": .., "depth": .., "magnitude": .., ... }, ...]`
/// * `.parquet` – columns named like the feed header
pub fn load_file(path: &Path) -> Result<ParseReport> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => {
            let text = std::fs::read_to_string(path).context("reading CSV file")?;
            Ok(parse_feed(&text))
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Write events as CSV in feed column order, so the output can be loaded back.
pub fn export_csv<'a>(
    path: &Path,
    events: impl IntoIterator<Item = &'a EventRecord>,
) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(FEED_HEADER).context("writing CSV header")?;

    let mut written = 0;
    for ev in events {
        writer
            .write_record([
                ev.latitude.to_string(),
                ev.longitude.to_string(),
                ev.depth.to_string(),
                ev.magnitude.to_string(),
                ev.induced.as_field().to_string(),
                ev.location.clone(),
                ev.timestamp.clone(),
            ])
            .with_context(|| format!("writing CSV row {}", written + 1))?;
        written += 1;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(written)
}

// ---------------------------------------------------------------------------
// Feed rows
// ---------------------------------------------------------------------------

/// Field mapping: lat, lon, depth, magnitude, induced, location..., timestamp.
/// Every field strictly between `induced` and the last one is location text.
fn admit_fields(fields: &[&str]) -> Result<EventRecord, RejectReason> {
    if fields.len() < MIN_FIELDS {
        return Err(RejectReason::TooFewFields {
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let last = fields.len() - 1;
    let location = fields[5..last].join(", ");
    let timestamp = fields[last].trim_matches('"');

    EventRecord::try_new(
        parse_number(fields[0]),
        parse_number(fields[1]),
        parse_number(fields[2]),
        parse_number(fields[3]),
        Induced::from_field(fields[4]),
        &location,
        timestamp,
    )
}

/// Unparseable or empty text becomes NaN and fails admission.
fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonEvent {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
    depth: Option<f64>,
    magnitude: Option<f64>,
    induced: Option<f64>,
    location: Option<String>,
    #[serde(alias = "timestamp")]
    datetime: Option<String>,
}

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "lat": 55.1, "lon": -3.2, "depth": 10, "magnitude": 2.3,
///     "induced": null, "location": "Glasgow", "datetime": "2024-01-05" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<ParseReport> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut events = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let row = i as u64 + 1;
        let admitted = serde_json::from_value::<JsonEvent>(rec.clone())
            .map_err(|e| RejectReason::Malformed(e.to_string()))
            .and_then(|raw| {
                EventRecord::try_new(
                    raw.lat.unwrap_or(f64::NAN),
                    raw.lon.unwrap_or(f64::NAN),
                    raw.depth.unwrap_or(f64::NAN),
                    raw.magnitude.unwrap_or(f64::NAN),
                    Induced::from_number(raw.induced),
                    raw.location.as_deref().unwrap_or(""),
                    raw.datetime.as_deref().unwrap_or(""),
                )
            });
        match admitted {
            Ok(event) => events.push(event),
            Err(reason) => rejected.push(RowRejection { row, reason }),
        }
    }

    Ok(ParseReport {
        dataset: EventDataset::from_events(events),
        rejected,
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet event table.
///
/// Expected schema:
/// - `lat`/`latitude`, `lon`/`longitude`, `depth`, `magnitude`: any float or int type
/// - `induced`: optional, nullable numeric
/// - `location`, `datetime`: optional strings
fn load_parquet(path: &Path) -> Result<ParseReport> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut events = Vec::new();
    let mut rejected = Vec::new();
    let mut rows_seen: u64 = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let lat_idx = column_index(&schema, &["lat", "latitude"])?;
        let lon_idx = column_index(&schema, &["lon", "longitude"])?;
        let depth_idx = column_index(&schema, &["depth"])?;
        let mag_idx = column_index(&schema, &["magnitude", "mag"])?;
        let induced_idx = optional_column_index(&schema, &["induced"]);
        let location_idx = optional_column_index(&schema, &["location"]);
        let datetime_idx = optional_column_index(&schema, &["datetime", "timestamp"]);

        for row in 0..batch.num_rows() {
            rows_seen += 1;
            let number = |idx: usize| extract_f64(batch.column(idx), row).unwrap_or(f64::NAN);
            let text = |idx: Option<usize>| {
                idx.and_then(|i| extract_string(batch.column(i), row))
                    .unwrap_or_default()
            };

            let induced = induced_idx.and_then(|i| extract_f64(batch.column(i), row));
            let admitted = EventRecord::try_new(
                number(lat_idx),
                number(lon_idx),
                number(depth_idx),
                number(mag_idx),
                Induced::from_number(induced),
                &text(location_idx),
                &text(datetime_idx),
            );
            match admitted {
                Ok(event) => events.push(event),
                Err(reason) => rejected.push(RowRejection {
                    row: rows_seen,
                    reason,
                }),
            }
        }
    }

    Ok(ParseReport {
        dataset: EventDataset::from_events(events),
        rejected,
    })
}

// -- Parquet / Arrow helpers --

fn column_index(schema: &Schema, names: &[&str]) -> Result<usize> {
    optional_column_index(schema, names)
        .with_context(|| format!("Parquet file missing '{}' column", names[0]))
}

fn optional_column_index(schema: &Schema, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| schema.index_of(name).ok())
}

/// Read a numeric cell; strings are parsed, anything else is `None`.
fn extract_f64(col: &ArrayRef, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        DataType::Utf8 | DataType::LargeUtf8 => extract_string(col, row)?.trim().parse().ok(),
        _ => None,
    }
}

fn extract_string(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string()),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| a.value(row).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::datatypes::Field;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "lat,lon,depth,magnitude,induced,location,datetime";

    #[test]
    fn parses_row_with_blank_induced() {
        let report = parse_feed(&format!("{HEADER}\n55.1,-3.2,10,2.3,,Glasgow,2024-01-05\n"));
        assert_eq!(report.dataset.len(), 1);
        assert_eq!(report.dropped(), 0);

        let ev = &report.dataset.events[0];
        assert_eq!(ev.latitude, 55.1);
        assert_eq!(ev.longitude, -3.2);
        assert_eq!(ev.depth, 10.0);
        assert_eq!(ev.magnitude, 2.3);
        assert_eq!(ev.induced, Induced::Unknown);
        assert_eq!(ev.location, "Glasgow");
        assert_eq!(ev.timestamp, "2024-01-05");
        assert!(ev.occurred_at.is_some());
    }

    #[test]
    fn drops_short_and_non_numeric_rows() {
        let text = format!(
            "{HEADER}\n\
             55.1,-3.2,10,2.3,Glasgow\n\
             abc,-3.2,10,2.3,0,Glasgow,2024-01-05\n\
             54.0,-2.0,3,1.1,1,Kendal,2024-02-01\n"
        );
        let report = parse_feed(&text);
        assert_eq!(report.dataset.len(), 1);
        assert_eq!(report.dataset.events[0].location, "Kendal");
        assert_eq!(report.dataset.events[0].induced, Induced::Yes);

        assert_eq!(report.dropped(), 2);
        assert_eq!(
            report.rejected[0].reason,
            RejectReason::TooFewFields { expected: 7, found: 5 }
        );
        assert_eq!(report.rejected[0].row, 2);
        assert_eq!(
            report.rejected[1].reason,
            RejectReason::NonFinite { field: "latitude" }
        );
    }

    #[test]
    fn empty_numeric_field_is_rejected() {
        let report = parse_feed(&format!("{HEADER}\n,-3.2,10,2.3,0,Glasgow,2024-01-05\n"));
        assert!(report.dataset.is_empty());
        assert_eq!(report.dropped(), 1);
    }

    #[test]
    fn multi_field_location_is_rejoined_and_cleaned() {
        let text = format!(
            "{HEADER}\n56.5,-5.1,7.5,1.9,0,\"Oban,  Argyll\",  'Scotland' ,2024-04-01T03:04:05Z\n"
        );
        let report = parse_feed(&text);
        assert_eq!(report.dataset.len(), 1);
        let ev = &report.dataset.events[0];
        assert_eq!(ev.location, "Oban, Argyll, Scotland");
        assert_eq!(ev.induced, Induced::No);
        assert_eq!(ev.timestamp, "2024-04-01T03:04:05Z");
    }

    #[test]
    fn blank_lines_and_crlf_are_tolerated() {
        let text = format!(
            "\r\n{HEADER}\r\n\r\n55.1,-3.2,10,2.3,,Glasgow,2024-01-05\r\n   \r\n54.0,-2.0,3,1.1,1,Kendal,2024-02-01\r\n\r\n"
        );
        let report = parse_feed(&text);
        assert_eq!(report.dataset.len(), 2);
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn row_of_empty_fields_is_counted_as_dropped() {
        let text = format!("{HEADER}\n,,,,,,\n55.1,-3.2,10,2.3,0,Glasgow,2024-01-05\n");
        let report = parse_feed(&text);
        assert_eq!(report.dataset.len(), 1);
        assert_eq!(report.dropped(), 1);
        assert_eq!(report.rejected[0].row, 2);
        assert_eq!(
            report.rejected[0].reason,
            RejectReason::NonFinite { field: "latitude" }
        );
    }

    #[test]
    fn header_only_and_empty_text_yield_empty_dataset() {
        assert!(parse_feed(HEADER).dataset.is_empty());
        assert!(parse_feed("").dataset.is_empty());
    }

    #[test]
    fn unparseable_timestamp_keeps_row() {
        let report = parse_feed(&format!("{HEADER}\n55.1,-3.2,10,2.3,1,Glasgow,not-a-date\n"));
        assert_eq!(report.dataset.len(), 1);
        assert_eq!(report.dataset.undated_count(), 1);
    }

    #[test]
    fn load_file_rejects_unknown_extension() {
        let err = load_file(Path::new("events.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn json_file_loads_through_same_admission() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"lat": 55.1, "lon": -3.2, "depth": 10, "magnitude": 2.3, "induced": null,
                  "location": "Glasgow", "datetime": "2024-01-05"}},
                {{"lat": "abc", "lon": -3.2, "depth": 10, "magnitude": 2.3}},
                {{"latitude": 54.0, "longitude": -2.0, "depth": 3, "magnitude": 1.1, "induced": 1}}
            ]"#
        )
        .unwrap();

        let report = load_file(file.path()).unwrap();
        assert_eq!(report.dataset.len(), 2);
        assert_eq!(report.dropped(), 1);
        assert_eq!(report.rejected[0].row, 2);
        assert!(matches!(report.rejected[0].reason, RejectReason::Malformed(_)));
        assert_eq!(report.dataset.events[1].induced, Induced::Yes);
        assert!(report.dataset.events[1].occurred_at.is_none());
    }

    #[test]
    fn parquet_file_loads_through_same_admission() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("lat", DataType::Float64, false),
            Field::new("lon", DataType::Float64, false),
            Field::new("depth", DataType::Float32, false),
            Field::new("magnitude", DataType::Float64, true),
            Field::new("induced", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("datetime", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![55.1, 54.0])),
                Arc::new(Float64Array::from(vec![-3.2, -2.0])),
                Arc::new(Float32Array::from(vec![10.0, 3.0])),
                Arc::new(Float64Array::from(vec![Some(2.3), None])),
                Arc::new(Int64Array::from(vec![None, Some(0)])),
                Arc::new(StringArray::from(vec![Some("Glasgow"), None])),
                Arc::new(StringArray::from(vec![Some("2024-01-05"), Some("2024-02-01")])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let report = load_file(file.path()).unwrap();
        assert_eq!(report.dataset.len(), 1);
        assert_eq!(report.dataset.events[0].location, "Glasgow");
        assert_eq!(report.dataset.events[0].induced, Induced::Unknown);
        assert_eq!(
            report.rejected,
            vec![RowRejection {
                row: 2,
                reason: RejectReason::NonFinite { field: "magnitude" },
            }]
        );
    }

    #[test]
    fn exported_view_reloads() {
        let text = format!(
            "{HEADER}\n\
             56.5,-5.1,7.5,1.9,0,Oban, Argyll,2024-04-01T03:04:05Z\n\
             54.0,-2.0,3,1.1,,Kendal,2024-02-01\n"
        );
        let original = parse_feed(&text).dataset;

        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let written = export_csv(file.path(), &original.events).unwrap();
        assert_eq!(written, 2);

        let reloaded = load_file(file.path()).unwrap();
        assert_eq!(reloaded.dropped(), 0);
        assert_eq!(reloaded.dataset.events, original.events);
    }
}
