/// Data layer: event model, feed access, derivations and export.
///
/// Architecture:
/// ```text
///  USGS GeoJSON (HTTP or local dir)
///        │
///        ▼
///   ┌──────────┐
///   │   feed    │  fetch + decode → Vec<EventRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  FeedSession  │  raw events, params, status (crate::session)
///   └──────────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  stats    │   │  filter   │  summary over all raw events / ordered view
///   └──────────┘   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  two-column CSV tables
///   └──────────┘
/// ```

pub mod export;
pub mod feed;
pub mod filter;
pub mod model;
pub mod stats;
pub mod time;
