use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Coordinates, EventRecord, TimeRange};
use crate::config::FeedConfig;

// ---------------------------------------------------------------------------
// FeedSource – where raw events come from
// ---------------------------------------------------------------------------

/// Why a feed could not produce events.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to fetch earthquake data (HTTP {0})")]
    Status(u16),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed feed document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A provider of event lists for a time window.
///
/// Implementations block; callers that must stay responsive run them on a
/// worker thread (see [`crate::worker::FetchWorker`]). No retries are made.
pub trait FeedSource: Send + Sync {
    fn fetch(&self, range: TimeRange) -> Result<Vec<EventRecord>, FetchError>;
}

/// Pick the feed implementation described by `config`.
pub fn source_from_config(config: &FeedConfig) -> Result<Box<dyn FeedSource>, FetchError> {
    match &config.local_dir {
        Some(dir) => {
            log::info!("Reading feeds from {}", dir.display());
            Ok(Box::new(DirectoryFeed::new(dir)))
        }
        None => {
            log::info!("Fetching feeds from {}", config.base_url);
            Ok(Box::new(UsgsFeed::new(config.clone())?))
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP feed
// ---------------------------------------------------------------------------

/// USGS GeoJSON summary feed over HTTP.
pub struct UsgsFeed {
    client: reqwest::blocking::Client,
    config: FeedConfig,
}

impl UsgsFeed {
    pub fn new(config: FeedConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("quakewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }
}

impl FeedSource for UsgsFeed {
    fn fetch(&self, range: TimeRange) -> Result<Vec<EventRecord>, FetchError> {
        let url = self.config.endpoint(range);
        log::debug!("GET {url}");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes()?;
        decode_feed(&body)
    }
}

// ---------------------------------------------------------------------------
// Local directory feed
// ---------------------------------------------------------------------------

/// Reads `all_<range>.geojson` documents from a directory.
pub struct DirectoryFeed {
    dir: PathBuf,
}

impl DirectoryFeed {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, range: TimeRange) -> PathBuf {
        self.dir.join(FeedConfig::file_name(range))
    }
}

impl FeedSource for DirectoryFeed {
    fn fetch(&self, range: TimeRange) -> Result<Vec<EventRecord>, FetchError> {
        let path = self.path_for(range);
        let bytes = std::fs::read(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        decode_feed(&bytes)
    }
}

// ---------------------------------------------------------------------------
// GeoJSON decoding
// ---------------------------------------------------------------------------

/// Expected document shape (USGS summary feed):
///
/// ```json
/// {
///   "type": "FeatureCollection",
///   "features": [
///     {
///       "id": "ci40123456",
///       "properties": { "mag": 2.1, "place": "8km N of Ridgecrest, CA",
///                       "time": 1700000000000, "title": "M 2.1 - ...",
///                       "url": "https://..." },
///       "geometry": { "coordinates": [-117.6, 35.7, 8.2] }
///     }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    /// Missing or `null` reads as an empty list.
    #[serde(default)]
    features: Option<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: Option<String>,
    properties: Option<Properties>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    /// Kept raw so a malformed magnitude does not drop the whole feature.
    #[serde(default)]
    mag: Option<JsonValue>,
    place: Option<String>,
    time: Option<i64>,
    title: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<Option<f64>>,
}

/// Decode a feed document into event records.
///
/// Only a document that is not a feature collection is an error. Individual
/// features that lack an id, a time or a position are skipped with a warning.
/// A magnitude that is not a number is kept as `NaN`.
pub fn decode_feed(bytes: &[u8]) -> Result<Vec<EventRecord>, FetchError> {
    let collection: FeatureCollection = serde_json::from_slice(bytes)?;
    let features = collection.features.unwrap_or_default();
    let total = features.len();

    let events: Vec<EventRecord> = features
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match decode_feature(raw) {
            Ok(event) => Some(event),
            Err(reason) => {
                log::warn!("Skipping feature {i}: {reason}");
                None
            }
        })
        .collect();

    if events.len() < total {
        log::warn!("Decoded {} of {total} features", events.len());
    }
    Ok(events)
}

/// `null` or absent is `0.0`; numbers pass through; numeric strings are
/// parsed; anything else becomes `NaN`.
fn decode_magnitude(raw: Option<&JsonValue>) -> f64 {
    match raw {
        None | Some(JsonValue::Null) => 0.0,
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        Some(_) => f64::NAN,
    }
}

fn decode_feature(raw: JsonValue) -> Result<EventRecord, String> {
    let feature: Feature = serde_json::from_value(raw).map_err(|e| e.to_string())?;

    let id = feature
        .id
        .filter(|id| !id.is_empty())
        .ok_or("missing id")?;
    let props = feature
        .properties
        .ok_or_else(|| format!("{id}: missing properties"))?;
    let occurred_at_ms = props.time.ok_or_else(|| format!("{id}: missing time"))?;

    let coords = feature.geometry.map(|g| g.coordinates).unwrap_or_default();
    let (Some(Some(longitude)), Some(Some(latitude))) = (coords.first(), coords.get(1)) else {
        return Err(format!("{id}: missing longitude/latitude"));
    };
    let depth_km = coords.get(2).copied().flatten();

    let magnitude = decode_magnitude(props.mag.as_ref());
    if !magnitude.is_finite() {
        log::warn!("{id}: non-numeric magnitude {:?}", props.mag);
    }

    Ok(EventRecord {
        magnitude,
        place: props.place.unwrap_or_default(),
        title: props.title.unwrap_or_default(),
        occurred_at_ms,
        url: props.url.unwrap_or_default(),
        coordinates: Coordinates {
            longitude: *longitude,
            latitude: *latitude,
            depth_km,
        },
        id,
    })
}
