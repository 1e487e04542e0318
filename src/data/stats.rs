use super::model::{EventRecord, StatsSummary};

/// Window used for `recent_count`.
pub const RECENT_WINDOW_MS: i64 = 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute statistics over `events` relative to the current wall clock.
pub fn compute_stats(events: &[EventRecord]) -> StatsSummary {
    compute_stats_at(events, super::time::now_ms())
}

/// Compute statistics over `events` with an explicit evaluation time.
///
/// Every record counts towards `total` and `by_region`. Records with a
/// non-finite magnitude are left out of the band counts, the average and the
/// `strongest` comparison.
pub fn compute_stats_at(events: &[EventRecord], now_ms: i64) -> StatsSummary {
    let mut stats = StatsSummary {
        total: events.len(),
        ..StatsSummary::default()
    };
    if events.is_empty() {
        return stats;
    }

    let recent_cutoff = now_ms.saturating_sub(RECENT_WINDOW_MS);
    let mut magnitude_sum = 0.0;
    let mut finite_count = 0usize;

    for event in events {
        *stats.by_region.entry(event.region()).or_insert(0) += 1;

        if event.occurred_at_ms > recent_cutoff {
            stats.recent_count += 1;
        }

        let Some(band) = event.band() else {
            continue;
        };
        *stats.by_magnitude_band.entry(band).or_insert(0) += 1;
        magnitude_sum += event.magnitude;
        finite_count += 1;

        // Strict `>` keeps the first record on ties.
        let stronger = stats
            .strongest
            .as_ref()
            .map_or(true, |best| event.magnitude > best.magnitude);
        if stronger {
            stats.strongest = Some(event.clone());
        }
    }

    if finite_count > 0 {
        stats.average_magnitude = magnitude_sum / finite_count as f64;
    }
    stats
}
