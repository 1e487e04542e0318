use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// EventRecord – one seismic event from the feed
// ---------------------------------------------------------------------------

/// Position of an event: longitude, latitude and (optional) depth in km.
///
/// Depth may be negative when the hypocentre lies above the sea-level datum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
    pub depth_km: Option<f64>,
}

/// A single normalised event record.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Feed identifier, stable across refetches of the same event.
    pub id: String,
    /// Magnitude; an absent feed value decodes as `0.0`.
    pub magnitude: f64,
    /// Free-text location, usually `"<local description>, <region>"`.
    pub place: String,
    pub title: String,
    /// Unix epoch milliseconds.
    pub occurred_at_ms: i64,
    /// Passed through to the UI untouched.
    pub url: String,
    pub coordinates: Coordinates,
}

impl EventRecord {
    /// Region label derived from `place` (see [`region_of`]).
    pub fn region(&self) -> String {
        region_of(&self.place)
    }

    /// Band of this event, or `None` for a non-finite magnitude.
    pub fn band(&self) -> Option<MagnitudeBand> {
        MagnitudeBand::of(self.magnitude)
    }
}

/// Label used when a place yields no usable region text.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Extract the coarse region from a place description.
///
/// Takes the text after the last comma, trimmed. Without a comma the whole
/// place is used. Empty or whitespace-only results map to [`UNKNOWN_REGION`].
pub fn region_of(place: &str) -> String {
    let tail = match place.rsplit_once(',') {
        Some((_, region)) => region,
        None => place,
    };
    let tail = tail.trim();
    if tail.is_empty() {
        UNKNOWN_REGION.to_string()
    } else {
        tail.to_string()
    }
}

// ---------------------------------------------------------------------------
// MagnitudeBand – fixed histogram buckets
// ---------------------------------------------------------------------------

/// One of the four fixed magnitude ranges.
///
/// Variants are declared strongest-first so the derived `Ord` matches the
/// order the dashboard lists them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MagnitudeBand {
    Major,
    Moderate,
    Light,
    Minor,
}

impl MagnitudeBand {
    /// All bands, strongest first.
    pub const ALL: [MagnitudeBand; 4] = [
        MagnitudeBand::Major,
        MagnitudeBand::Moderate,
        MagnitudeBand::Light,
        MagnitudeBand::Minor,
    ];

    /// Classify a magnitude. Thresholds are checked from the top down, so
    /// exactly 4.5 lands in `Moderate`.
    pub fn of(magnitude: f64) -> Option<Self> {
        if !magnitude.is_finite() {
            return None;
        }
        Some(if magnitude >= 6.0 {
            MagnitudeBand::Major
        } else if magnitude >= 4.5 {
            MagnitudeBand::Moderate
        } else if magnitude >= 3.0 {
            MagnitudeBand::Light
        } else {
            MagnitudeBand::Minor
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            MagnitudeBand::Major => "6.0+",
            MagnitudeBand::Moderate => "4.5-5.9",
            MagnitudeBand::Light => "3.0-4.4",
            MagnitudeBand::Minor => "0-2.9",
        }
    }
}

impl fmt::Display for MagnitudeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Filter parameters
// ---------------------------------------------------------------------------

/// Historical window requested from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Hour,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
    ];

    /// Key used in feed file names (`all_<key>.geojson`).
    pub fn key(self) -> &'static str {
        match self {
            TimeRange::Hour => "hour",
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        }
    }

    /// Human-readable label for selectors and headings.
    pub fn label(self) -> &'static str {
        match self {
            TimeRange::Hour => "Last Hour",
            TimeRange::Day => "Last 24 Hours",
            TimeRange::Week => "Last 7 Days",
            TimeRange::Month => "Last 30 Days",
        }
    }

    /// Span of the window in milliseconds.
    pub fn span_ms(self) -> i64 {
        const HOUR_MS: i64 = 60 * 60 * 1000;
        match self {
            TimeRange::Hour => HOUR_MS,
            TimeRange::Day => 24 * HOUR_MS,
            TimeRange::Week => 7 * 24 * HOUR_MS,
            TimeRange::Month => 30 * 24 * HOUR_MS,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a string is not one of `hour`, `day`, `week`, `month`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time range {0:?} (expected hour, day, week or month)")]
pub struct UnknownTimeRange(pub String);

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTimeRange(s.to_string()))
    }
}

/// View ordering; always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Newest first.
    #[default]
    Time,
    /// Strongest first.
    Magnitude,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Time => "Sort by Time",
            SortKey::Magnitude => "Sort by Magnitude",
        }
    }
}

/// User-controlled parameters for fetching and viewing events.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub time_range: TimeRange,
    /// Minimum magnitude (inclusive); `0.0` means no filter.
    pub magnitude_floor: f64,
    /// Case-insensitive substring on place or title; empty means no filter.
    pub location: String,
    pub sort_key: SortKey,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            time_range: TimeRange::default(),
            magnitude_floor: 0.0,
            location: String::new(),
            sort_key: SortKey::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// StatsSummary – derived statistics over the raw event list
// ---------------------------------------------------------------------------

/// Aggregate statistics over the full raw event set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsSummary {
    pub total: usize,
    /// Only bands that received at least one event are present.
    pub by_magnitude_band: BTreeMap<MagnitudeBand, usize>,
    pub average_magnitude: f64,
    pub strongest: Option<EventRecord>,
    /// Events within the trailing hour at evaluation time.
    pub recent_count: usize,
    pub by_region: BTreeMap<String, usize>,
}

impl StatsSummary {
    /// Count for a band, `0` when the band never occurred.
    pub fn band_count(&self, band: MagnitudeBand) -> usize {
        self.by_magnitude_band.get(&band).copied().unwrap_or(0)
    }

    /// Regions ordered by count descending, ties by label; at most `n`.
    pub fn top_regions(&self, n: usize) -> Vec<(&str, usize)> {
        let mut regions: Vec<(&str, usize)> = self
            .by_region
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        regions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        regions.truncate(n);
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_after_last_comma() {
        assert_eq!(region_of("10km NE of Tokyo, Japan"), "Japan");
        assert_eq!(region_of("5km S of Volcano, Hawaii, USA"), "USA");
    }

    #[test]
    fn region_without_comma_is_whole_place() {
        assert_eq!(region_of("Ridgecrest"), "Ridgecrest");
    }

    #[test]
    fn empty_region_is_unknown() {
        assert_eq!(region_of(""), UNKNOWN_REGION);
        assert_eq!(region_of("   "), UNKNOWN_REGION);
        assert_eq!(region_of("Somewhere,  "), UNKNOWN_REGION);
    }

    #[test]
    fn band_thresholds_are_inclusive_from_the_top() {
        assert_eq!(MagnitudeBand::of(6.0), Some(MagnitudeBand::Major));
        assert_eq!(MagnitudeBand::of(5.99), Some(MagnitudeBand::Moderate));
        assert_eq!(MagnitudeBand::of(4.5), Some(MagnitudeBand::Moderate));
        assert_eq!(MagnitudeBand::of(4.49), Some(MagnitudeBand::Light));
        assert_eq!(MagnitudeBand::of(3.0), Some(MagnitudeBand::Light));
        assert_eq!(MagnitudeBand::of(2.9), Some(MagnitudeBand::Minor));
        assert_eq!(MagnitudeBand::of(-0.8), Some(MagnitudeBand::Minor));
        assert_eq!(MagnitudeBand::of(f64::NAN), None);
        assert_eq!(MagnitudeBand::of(f64::INFINITY), None);
    }

    #[test]
    fn time_range_parses_known_keys_only() {
        assert_eq!("week".parse::<TimeRange>(), Ok(TimeRange::Week));
        assert_eq!(" Month ".parse::<TimeRange>(), Ok(TimeRange::Month));
        assert!("year".parse::<TimeRange>().is_err());
    }

    #[test]
    fn top_regions_orders_by_count_then_label() {
        let mut stats = StatsSummary::default();
        stats.by_region.insert("Alaska".into(), 3);
        stats.by_region.insert("Chile".into(), 5);
        stats.by_region.insert("CA".into(), 3);
        stats.by_region.insert("Japan".into(), 1);

        let top = stats.top_regions(3);
        assert_eq!(top, vec![("Chile", 5), ("Alaska", 3), ("CA", 3)]);
    }
}
