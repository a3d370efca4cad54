/// Data layer: event types, parsing, and the derived views.
///
/// Architecture:
/// ```text
///  HTTP feed / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows → ParseReport (dataset + rejected rows)
///   └──────────┘
///        │
///        ├────────────────┬──────────────────┐
///        ▼                ▼                  ▼
///   ┌──────────┐   ┌────────────┐     ┌──────────┐
///   │  bounds   │   │  timeline   │     │  filter   │  magnitude, depth,
///   └──────────┘   └────────────┘     └──────────┘  induced, time window
///   padded bbox     sorted instants,    → visible indices
///                   monthly histogram
/// ```

pub mod bounds;
pub mod filter;
pub mod loader;
pub mod model;
pub mod timeline;
