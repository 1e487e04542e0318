use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use quakewatch::data::export::{self, StatsTable};
use quakewatch::data::model::{SortKey, TimeRange};
use quakewatch::session::{FeedSession, SessionChange};
use quakewatch::worker::FetchWorker;

/// How often wall-clock dependent stats ("last hour") are re-derived.
pub const RECOMPUTE_INTERVAL: Duration = Duration::from_secs(30);

/// Magnitude floors offered in the filter selector.
pub const MAGNITUDE_FLOORS: [(f64, &str); 4] = [
    (0.0, "All Magnitudes"),
    (3.0, "3.0+"),
    (4.5, "4.5+"),
    (6.0, "6.0+"),
];

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Raw events, parameters and derived outputs.
    pub session: FeedSession,

    /// Text in the search box; applied to the session on Search / Enter.
    pub search_input: String,

    /// Whether to announce newly arrived events after a refresh.
    pub notifications: bool,

    /// Status / notice message shown in the top bar.
    pub status_message: Option<String>,

    worker: FetchWorker,
    changes: Receiver<SessionChange>,
    first_load_done: bool,
    last_recompute: Instant,
}

impl AppState {
    /// Build the state and start the initial load.
    pub fn new(worker: FetchWorker) -> Self {
        let mut session = FeedSession::default();
        let changes = session.subscribe();
        worker.dispatch(session.refresh());

        Self {
            session,
            search_input: String::new(),
            notifications: false,
            status_message: None,
            worker,
            changes,
            first_load_done: false,
            last_recompute: Instant::now(),
        }
    }

    /// Apply finished fetches and react to session changes. Called once per
    /// frame.
    pub fn poll(&mut self) {
        self.worker.pump(&mut self.session);

        if self.last_recompute.elapsed() >= RECOMPUTE_INTERVAL {
            self.session.recompute();
            self.last_recompute = Instant::now();
        }

        while let Ok(change) = self.changes.try_recv() {
            if let SessionChange::EventsReplaced { new_events, .. } = change {
                self.last_recompute = Instant::now();
                if self.notifications && self.first_load_done && new_events > 0 {
                    self.status_message = Some(format!("🔔 {new_events} new earthquakes"));
                }
                self.first_load_done = true;
            }
        }
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        let ticket = self.session.set_time_range(range);
        self.worker.dispatch_opt(ticket);
    }

    pub fn refresh(&mut self) {
        self.status_message = None;
        let ticket = self.session.refresh();
        self.worker.dispatch(ticket);
    }

    /// Push the search box text into the location filter.
    pub fn apply_search(&mut self) {
        self.session.set_location_filter(self.search_input.trim());
    }

    pub fn clear_filters(&mut self) {
        self.search_input.clear();
        self.session.set_location_filter("");
    }

    pub fn set_magnitude_floor(&mut self, floor: f64) {
        if let Err(e) = self.session.set_magnitude_floor(floor) {
            log::warn!("{e}");
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.session.set_sort_key(key);
    }

    /// Toggle selection of the event with `id`.
    pub fn toggle_selection(&mut self, id: &str) {
        if self.session.selection().is_some_and(|e| e.id == id) {
            self.session.select(None);
        } else {
            self.session.select_id(id);
        }
    }

    /// Ask for a destination and write a statistics table there.
    pub fn export_dialog(&mut self, table: StatsTable) {
        let default_name = export::default_file_name(self.session.params().time_range, table);
        let file = rfd::FileDialog::new()
            .set_title("Export statistics")
            .set_file_name(&default_name)
            .add_filter("CSV", &["csv"])
            .save_file();

        let Some(path) = file else {
            return;
        };
        match export::export_to_file(self.session.stats(), table, &path) {
            Ok(()) => {
                self.status_message = Some(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export statistics: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
