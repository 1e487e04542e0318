use std::cmp::Ordering;

use super::model::{EventRecord, FilterParams, SortKey};

// ---------------------------------------------------------------------------
// View predicate and ordering
// ---------------------------------------------------------------------------

/// Whether a single event passes the magnitude and location filters.
///
/// `needle` must already be lowercased. A non-finite magnitude never passes
/// the magnitude comparison.
fn passes(event: &EventRecord, magnitude_floor: f64, needle: &str) -> bool {
    if !event.magnitude.is_finite() || event.magnitude < magnitude_floor {
        return false;
    }
    if needle.is_empty() {
        return true;
    }
    event.place.to_lowercase().contains(needle) || event.title.to_lowercase().contains(needle)
}

/// Build the display list: filter by magnitude, then by location, then sort
/// descending on the chosen key.
///
/// The sort is stable, so records with equal keys keep their input order.
/// Magnitudes compare numerically, so `-0.0` and `0.0` are a tie. The input
/// slice is left untouched.
pub fn compute_view(events: &[EventRecord], params: &FilterParams) -> Vec<EventRecord> {
    let needle = params.location.to_lowercase();

    let mut view: Vec<EventRecord> = events
        .iter()
        .filter(|e| passes(e, params.magnitude_floor, &needle))
        .cloned()
        .collect();

    match params.sort_key {
        SortKey::Time => view.sort_by(|a, b| b.occurred_at_ms.cmp(&a.occurred_at_ms)),
        // Only finite magnitudes reach this point.
        SortKey::Magnitude => view.sort_by(|a, b| {
            b.magnitude
                .partial_cmp(&a.magnitude)
                .unwrap_or(Ordering::Equal)
        }),
    }
    view
}
