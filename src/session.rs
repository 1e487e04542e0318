use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

use crate::data::feed::FetchError;
use crate::data::filter::compute_view;
use crate::data::model::{EventRecord, FilterParams, SortKey, StatsSummary, TimeRange};
use crate::data::stats::compute_stats_at;
use crate::data::time::now_ms;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Lifecycle of the raw event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready,
    /// Last fetch failed; previously loaded events (if any) are still served.
    Failed,
}

/// Rejected parameter change. State is left as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("magnitude floor must be a finite number >= 0, got {0}")]
    InvalidMagnitudeFloor(f64),
    #[error(transparent)]
    InvalidTimeRange(#[from] crate::data::model::UnknownTimeRange),
}

/// Handle for one issued fetch. Only the most recently issued ticket's
/// completion is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub range: TimeRange,
}

/// What changed in the session, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    /// Status moved (and, for `Failed`, an error message was stored).
    Status(FeedStatus),
    /// Raw events were replaced; `new_events` counts ids absent before.
    EventsReplaced { total: usize, new_events: usize },
    /// A filter or sort parameter changed and the view was recomputed.
    Params,
    /// Stats or view moved on a periodic recompute (events aged out of the
    /// recent window).
    Derived,
    /// The selected record changed, including a refetched copy of the same id.
    Selection,
}

/// Owns the raw events, the user parameters and everything derived from them.
///
/// The session performs no IO. Operations that need data return a
/// [`FetchTicket`]; the host runs the feed and reports back through
/// [`FeedSession::complete_fetch`].
pub struct FeedSession {
    params: FilterParams,
    raw: Vec<EventRecord>,
    status: FeedStatus,
    error: Option<String>,
    selection: Option<EventRecord>,

    stats: StatsSummary,
    view: Vec<EventRecord>,

    issued_generation: u64,
    revision: u64,
    subscribers: Vec<Sender<SessionChange>>,
}

impl Default for FeedSession {
    fn default() -> Self {
        Self::new(FilterParams::default())
    }
}

impl FeedSession {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            raw: Vec::new(),
            status: FeedStatus::Idle,
            error: None,
            selection: None,
            stats: StatsSummary::default(),
            view: Vec::new(),
            issued_generation: 0,
            revision: 0,
            subscribers: Vec::new(),
        }
    }

    // -- Reads --------------------------------------------------------------

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn raw_events(&self) -> &[EventRecord] {
        &self.raw
    }

    /// Statistics over the full raw set (not the filtered view).
    pub fn stats(&self) -> &StatsSummary {
        &self.stats
    }

    pub fn view(&self) -> &[EventRecord] {
        &self.view
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> Option<&EventRecord> {
        self.selection.as_ref()
    }

    /// Increases on every observable change: status, raw events, parameters,
    /// derived stats or view, and selection.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receive a [`SessionChange`] for every subsequent change. Dropped
    /// receivers are pruned on the next broadcast.
    pub fn subscribe(&mut self) -> Receiver<SessionChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    // -- Fetch lifecycle ----------------------------------------------------

    /// Switch to another time window. Returns a ticket to fetch, or `None`
    /// when `range` is already active.
    pub fn set_time_range(&mut self, range: TimeRange) -> Option<FetchTicket> {
        if range == self.params.time_range {
            return None;
        }
        log::info!("Time range {} -> {}", self.params.time_range, range);
        self.params.time_range = range;
        Some(self.begin_fetch())
    }

    /// Parse a time range key (`hour`, `day`, `week`, `month`) and switch to it.
    pub fn set_time_range_key(&mut self, key: &str) -> Result<Option<FetchTicket>, SessionError> {
        let range = key.parse::<TimeRange>()?;
        Ok(self.set_time_range(range))
    }

    /// Fetch the current window again. Also used for the initial load.
    pub fn refresh(&mut self) -> FetchTicket {
        self.begin_fetch()
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_generation += 1;
        let ticket = FetchTicket {
            generation: self.issued_generation,
            range: self.params.time_range,
        };
        self.error = None;
        self.status = FeedStatus::Loading;
        log::info!(
            "Fetching {} feed (generation {})",
            ticket.range,
            ticket.generation
        );
        self.notify(SessionChange::Status(FeedStatus::Loading));
        ticket
    }

    /// Apply a fetch outcome. Returns `false` when the outcome was discarded:
    /// the ticket has been superseded, or no fetch is in flight (the ticket
    /// was already completed, or never issued).
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<EventRecord>, FetchError>,
    ) -> bool {
        if ticket.generation != self.issued_generation {
            log::debug!(
                "Discarding stale {} fetch (generation {}, latest {})",
                ticket.range,
                ticket.generation,
                self.issued_generation
            );
            return false;
        }
        if self.status != FeedStatus::Loading {
            log::debug!(
                "Discarding {} fetch (generation {}): session is {:?}, not loading",
                ticket.range,
                ticket.generation,
                self.status
            );
            return false;
        }

        match outcome {
            Ok(events) => {
                let known: HashSet<&str> = self.raw.iter().map(|e| e.id.as_str()).collect();
                let new_events = events
                    .iter()
                    .filter(|e| !known.contains(e.id.as_str()))
                    .count();
                log::info!(
                    "Loaded {} events for {} ({new_events} new)",
                    events.len(),
                    ticket.range
                );

                self.raw = events;
                self.rebind_selection();
                self.status = FeedStatus::Ready;
                self.rederive(now_ms());
                self.notify(SessionChange::EventsReplaced {
                    total: self.raw.len(),
                    new_events,
                });
                self.notify(SessionChange::Status(FeedStatus::Ready));
            }
            Err(e) => {
                log::error!("Failed to fetch {} feed: {e}", ticket.range);
                // Cached events stay; a stale list beats a blank display.
                self.error = Some(e.to_string());
                self.status = FeedStatus::Failed;
                self.notify(SessionChange::Status(FeedStatus::Failed));
            }
        }
        true
    }

    /// Point the selection at the refetched record with the same id.
    fn rebind_selection(&mut self) {
        if let Some(selected) = &self.selection {
            if let Some(fresh) = self.raw.iter().find(|e| e.id == selected.id) {
                self.selection = Some(fresh.clone());
            }
        }
    }

    // -- Local parameters ---------------------------------------------------

    pub fn set_magnitude_floor(&mut self, floor: f64) -> Result<(), SessionError> {
        if !floor.is_finite() || floor < 0.0 {
            return Err(SessionError::InvalidMagnitudeFloor(floor));
        }
        if floor != self.params.magnitude_floor {
            self.params.magnitude_floor = floor;
            self.params_changed();
        }
        Ok(())
    }

    pub fn set_location_filter(&mut self, location: impl Into<String>) {
        let location = location.into();
        if location != self.params.location {
            self.params.location = location;
            self.params_changed();
        }
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        if key != self.params.sort_key {
            self.params.sort_key = key;
            self.params_changed();
        }
    }

    /// Highlight an event, or clear the highlight with `None`.
    ///
    /// Re-selecting an identical record is silent; a different record with the
    /// same id (a refetched copy) counts as a change.
    pub fn select(&mut self, event: Option<EventRecord>) {
        if self.selection == event {
            return;
        }
        self.selection = event;
        self.notify(SessionChange::Selection);
    }

    /// Select by id among the raw events. Unknown ids clear the selection.
    pub fn select_id(&mut self, id: &str) {
        let event = self.raw.iter().find(|e| e.id == id).cloned();
        self.select(event);
    }

    fn params_changed(&mut self) {
        self.view = compute_view(&self.raw, &self.params);
        self.notify(SessionChange::Params);
    }

    // -- Derivation ---------------------------------------------------------

    /// Re-derive stats and view from the current raw events. Stats depend on
    /// the wall clock, so hosts may call this periodically.
    pub fn recompute(&mut self) {
        self.recompute_at(now_ms());
    }

    /// [`recompute`](Self::recompute) against an explicit clock. Subscribers
    /// hear [`SessionChange::Derived`] only when the result differs.
    pub fn recompute_at(&mut self, now_ms: i64) {
        if self.rederive(now_ms) {
            self.notify(SessionChange::Derived);
        }
    }

    /// Returns whether stats or view changed.
    fn rederive(&mut self, now_ms: i64) -> bool {
        let stats = compute_stats_at(&self.raw, now_ms);
        let view = compute_view(&self.raw, &self.params);
        let changed = stats != self.stats || view != self.view;
        self.stats = stats;
        self.view = view;
        changed
    }

    fn notify(&mut self, change: SessionChange) {
        self.revision += 1;
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Coordinates;

    fn event(id: &str, magnitude: f64) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            magnitude,
            place: format!("near {id}, Testland"),
            title: format!("M {magnitude} - {id}"),
            occurred_at_ms: 0,
            url: String::new(),
            coordinates: Coordinates {
                longitude: 0.0,
                latitude: 0.0,
                depth_km: None,
            },
        }
    }

    #[test]
    fn starts_idle_and_loads_on_refresh() {
        let mut session = FeedSession::default();
        assert_eq!(session.status(), FeedStatus::Idle);

        let ticket = session.refresh();
        assert!(session.is_loading());
        assert_eq!(ticket.range, TimeRange::Day);

        assert!(session.complete_fetch(ticket, Ok(vec![event("a", 2.0)])));
        assert_eq!(session.status(), FeedStatus::Ready);
        assert_eq!(session.stats().total, 1);
        assert_eq!(session.view().len(), 1);
    }

    #[test]
    fn same_time_range_is_a_no_op() {
        let mut session = FeedSession::default();
        assert!(session.set_time_range(TimeRange::Day).is_none());
        assert_eq!(session.status(), FeedStatus::Idle);
    }

    #[test]
    fn failure_keeps_cached_events() {
        let mut session = FeedSession::default();
        let first = session.refresh();
        session.complete_fetch(first, Ok(vec![event("a", 5.0), event("b", 1.0)]));

        let ticket = session.set_time_range(TimeRange::Week).unwrap();
        session.complete_fetch(ticket, Err(FetchError::Status(503)));

        assert_eq!(session.status(), FeedStatus::Failed);
        assert!(session.error().unwrap().contains("503"));
        assert_eq!(session.raw_events().len(), 2);
        assert_eq!(session.stats().total, 2);
        assert_eq!(session.params().time_range, TimeRange::Week);
    }

    #[test]
    fn new_fetch_clears_previous_error() {
        let mut session = FeedSession::default();
        let ticket = session.refresh();
        session.complete_fetch(ticket, Err(FetchError::Status(500)));
        assert!(session.error().is_some());

        session.refresh();
        assert!(session.error().is_none());
        assert!(session.is_loading());
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut session = FeedSession::default();
        let a = session.set_time_range(TimeRange::Hour).unwrap();
        let b = session.set_time_range(TimeRange::Month).unwrap();

        assert!(session.complete_fetch(b, Ok(vec![event("b", 3.0)])));
        assert!(!session.complete_fetch(a, Ok(vec![event("a", 3.0)])));

        assert_eq!(session.raw_events()[0].id, "b");
        assert_eq!(session.status(), FeedStatus::Ready);
    }

    #[test]
    fn stale_failure_does_not_flip_status() {
        let mut session = FeedSession::default();
        let a = session.refresh();
        let b = session.refresh();
        session.complete_fetch(b, Ok(vec![event("x", 1.0)]));
        assert!(!session.complete_fetch(a, Err(FetchError::Status(500))));
        assert_eq!(session.status(), FeedStatus::Ready);
        assert!(session.error().is_none());
    }

    #[test]
    fn invalid_parameters_leave_state_untouched() {
        let mut session = FeedSession::default();
        session.set_magnitude_floor(2.5).unwrap();
        let revision = session.revision();

        assert_eq!(
            session.set_magnitude_floor(-1.0),
            Err(SessionError::InvalidMagnitudeFloor(-1.0))
        );
        assert!(session.set_magnitude_floor(f64::NAN).is_err());
        assert!(session.set_time_range_key("decade").is_err());

        assert_eq!(session.params().magnitude_floor, 2.5);
        assert_eq!(session.params().time_range, TimeRange::Day);
        assert_eq!(session.status(), FeedStatus::Idle);
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn local_parameters_only_touch_the_view() {
        let mut session = FeedSession::default();
        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("a", 1.0), event("b", 4.0)]));
        let stats_before = session.stats().clone();

        session.set_magnitude_floor(3.0).unwrap();
        session.set_sort_key(SortKey::Magnitude);
        session.set_location_filter("B");

        assert_eq!(session.status(), FeedStatus::Ready);
        assert_eq!(session.view().len(), 1);
        assert_eq!(session.view()[0].id, "b");
        assert_eq!(session.stats(), &stats_before);
    }

    #[test]
    fn selection_survives_filtering_and_refetch() {
        let mut session = FeedSession::default();
        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("a", 1.0), event("b", 4.0)]));

        session.select_id("a");
        session.set_magnitude_floor(3.0).unwrap();
        assert_eq!(session.selection().map(|e| e.id.as_str()), Some("a"));
        assert!(session.view().iter().all(|e| e.id != "a"));

        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("a", 1.5)]));
        assert_eq!(session.selection().map(|e| e.magnitude), Some(1.5));

        session.select(None);
        assert!(session.selection().is_none());
    }

    #[test]
    fn repeated_completion_of_the_same_ticket_is_ignored() {
        let mut session = FeedSession::default();
        let ticket = session.refresh();
        assert!(session.complete_fetch(ticket, Ok(vec![event("a", 2.0)])));
        let revision = session.revision();

        assert!(!session.complete_fetch(ticket, Err(FetchError::Status(500))));
        assert!(!session.complete_fetch(ticket, Ok(Vec::new())));

        assert_eq!(session.status(), FeedStatus::Ready);
        assert!(session.error().is_none());
        assert_eq!(session.raw_events().len(), 1);
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn completion_without_an_issued_fetch_is_ignored() {
        let mut session = FeedSession::default();
        let never_issued = FetchTicket {
            generation: 0,
            range: TimeRange::Day,
        };
        assert!(!session.complete_fetch(never_issued, Ok(vec![event("a", 2.0)])));
        assert_eq!(session.status(), FeedStatus::Idle);
        assert!(session.raw_events().is_empty());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn recompute_reports_only_real_changes() {
        let mut session = FeedSession::default();
        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("a", 2.0)]));
        let rx = session.subscribe();

        // Seen from time 0 the event is recent; from an hour later it is not.
        session.recompute_at(0);
        assert_eq!(session.stats().recent_count, 1);
        let revision = session.revision();

        session.recompute_at(0);
        assert_eq!(session.revision(), revision);

        session.recompute_at(crate::data::stats::RECENT_WINDOW_MS);
        assert_eq!(session.stats().recent_count, 0);
        assert_eq!(session.revision(), revision + 1);

        let changes: Vec<SessionChange> = rx.try_iter().collect();
        assert_eq!(changes, vec![SessionChange::Derived, SessionChange::Derived]);
    }

    #[test]
    fn selecting_a_refetched_copy_is_a_change() {
        let mut session = FeedSession::default();
        session.select(Some(event("a", 1.0)));
        let revision = session.revision();

        session.select(Some(event("a", 1.0)));
        assert_eq!(session.revision(), revision);

        session.select(Some(event("a", 1.5)));
        assert_eq!(session.revision(), revision + 1);
        assert_eq!(session.selection().map(|e| e.magnitude), Some(1.5));
    }

    #[test]
    fn subscribers_see_changes_in_order() {
        let mut session = FeedSession::default();
        let rx = session.subscribe();

        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("a", 1.0)]));
        session.set_sort_key(SortKey::Magnitude);

        let changes: Vec<SessionChange> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![
                SessionChange::Status(FeedStatus::Loading),
                SessionChange::EventsReplaced {
                    total: 1,
                    new_events: 1
                },
                SessionChange::Status(FeedStatus::Ready),
                SessionChange::Params,
            ]
        );
        assert_eq!(session.revision(), 4);
    }

    #[test]
    fn new_event_count_compares_ids_with_previous_fetch() {
        let mut session = FeedSession::default();
        let rx = session.subscribe();
        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("a", 1.0), event("b", 1.0)]));
        let ticket = session.refresh();
        session.complete_fetch(ticket, Ok(vec![event("b", 1.0), event("c", 1.0), event("d", 1.0)]));

        let last = rx
            .try_iter()
            .filter(|c| matches!(c, SessionChange::EventsReplaced { .. }))
            .last();
        assert_eq!(
            last,
            Some(SessionChange::EventsReplaced {
                total: 3,
                new_events: 2
            })
        );
    }
}
