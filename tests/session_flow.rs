use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quakewatch::data::feed::{DirectoryFeed, FeedSource, FetchError};
use quakewatch::data::model::{Coordinates, EventRecord, MagnitudeBand, SortKey, TimeRange};
use quakewatch::session::{FeedSession, FeedStatus};
use quakewatch::worker::FetchWorker;

const WAIT: Duration = Duration::from_secs(5);

fn event(id: &str, magnitude: f64, occurred_at_ms: i64) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        magnitude,
        place: format!("somewhere near {id}, Testland"),
        title: format!("M {magnitude:.1} - {id}"),
        occurred_at_ms,
        url: String::new(),
        coordinates: Coordinates {
            longitude: 10.0,
            latitude: 20.0,
            depth_km: Some(5.0),
        },
    }
}

/// Feed whose fetches block until the test opens the gate for that range.
struct GatedFeed {
    gates: Mutex<HashMap<TimeRange, Receiver<()>>>,
    results: HashMap<TimeRange, Vec<EventRecord>>,
}

impl GatedFeed {
    fn new(results: HashMap<TimeRange, Vec<EventRecord>>) -> (Self, HashMap<TimeRange, Sender<()>>) {
        let mut gates = HashMap::new();
        let mut openers = HashMap::new();
        for range in TimeRange::ALL {
            let (tx, rx) = mpsc::channel();
            gates.insert(range, rx);
            openers.insert(range, tx);
        }
        let feed = Self {
            gates: Mutex::new(gates),
            results,
        };
        (feed, openers)
    }
}

impl FeedSource for GatedFeed {
    fn fetch(&self, range: TimeRange) -> Result<Vec<EventRecord>, FetchError> {
        let gate = self.gates.lock().unwrap().remove(&range).expect("one fetch per range");
        gate.recv().unwrap();
        self.results.get(&range).cloned().ok_or(FetchError::Status(404))
    }
}

#[test]
fn late_result_from_superseded_range_is_discarded() {
    let results = HashMap::from([
        (TimeRange::Hour, vec![event("from-hour", 1.0, 1)]),
        (TimeRange::Week, vec![event("from-week", 2.0, 2), event("w2", 3.0, 3)]),
    ]);
    let (feed, openers) = GatedFeed::new(results);
    let worker = FetchWorker::new(Arc::new(feed));
    let mut session = FeedSession::default();

    worker.dispatch_opt(session.set_time_range(TimeRange::Hour));
    worker.dispatch_opt(session.set_time_range(TimeRange::Week));

    openers[&TimeRange::Week].send(()).unwrap();
    assert_eq!(worker.pump_blocking(&mut session, WAIT), Some(true));
    assert_eq!(session.status(), FeedStatus::Ready);

    openers[&TimeRange::Hour].send(()).unwrap();
    assert_eq!(worker.pump_blocking(&mut session, WAIT), Some(false));

    let ids: Vec<&str> = session.raw_events().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["from-week", "w2"]);
    assert_eq!(session.params().time_range, TimeRange::Week);
    assert_eq!(session.stats().total, 2);
}

#[test]
fn failed_fetch_through_worker_keeps_previous_data() {
    let results = HashMap::from([(TimeRange::Day, vec![event("d", 4.6, 1)])]);
    let (feed, openers) = GatedFeed::new(results);
    let worker = FetchWorker::new(Arc::new(feed));
    let mut session = FeedSession::default();

    worker.dispatch(session.refresh());
    openers[&TimeRange::Day].send(()).unwrap();
    assert_eq!(worker.pump_blocking(&mut session, WAIT), Some(true));

    // Month has no canned result, so the gated feed reports HTTP 404.
    worker.dispatch_opt(session.set_time_range(TimeRange::Month));
    openers[&TimeRange::Month].send(()).unwrap();
    assert_eq!(worker.pump_blocking(&mut session, WAIT), Some(true));

    assert_eq!(session.status(), FeedStatus::Failed);
    assert!(session.error().unwrap().contains("404"));
    assert_eq!(session.raw_events().len(), 1);
    assert_eq!(session.stats().band_count(MagnitudeBand::Moderate), 1);
}

#[test]
fn pump_without_completions_applies_nothing() {
    let (feed, _openers) = GatedFeed::new(HashMap::new());
    let worker = FetchWorker::new(Arc::new(feed));
    let mut session = FeedSession::default();
    assert_eq!(worker.pump(&mut session), 0);
    assert_eq!(session.status(), FeedStatus::Idle);
}

#[test]
fn wakeup_hook_fires_after_completion() {
    let (feed, openers) = GatedFeed::new(HashMap::from([(TimeRange::Day, Vec::new())]));
    let (woke_tx, woke_rx) = mpsc::channel();
    let woke_tx = Mutex::new(woke_tx);
    let worker = FetchWorker::new(Arc::new(feed)).with_wakeup(move || {
        let _ = woke_tx.lock().unwrap().send(());
    });
    let mut session = FeedSession::default();

    worker.dispatch(session.refresh());
    openers[&TimeRange::Day].send(()).unwrap();
    woke_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(worker.pump(&mut session), 1);
    assert_eq!(session.status(), FeedStatus::Ready);
    assert!(session.view().is_empty());
}

#[test]
fn directory_feed_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let doc = r#"{"type":"FeatureCollection","features":[
        {"id":"a","properties":{"mag":6.2,"place":"Offshore, Chile","time":3000,"title":"M 6.2 - Offshore, Chile","url":"u"},
         "geometry":{"coordinates":[-72.0,-33.0,20.0]}},
        {"id":"b","properties":{"mag":3.1,"place":"Ridgecrest","time":2990,"title":"M 3.1 - Ridgecrest","url":"u"},
         "geometry":{"coordinates":[-117.6,35.7,8.0]}},
        {"id":"c","properties":{"mag":4.9,"place":"10km NE of Tokyo, Japan","time":2995,"title":"M 4.9 - Tokyo","url":"u"},
         "geometry":{"coordinates":[139.8,35.8,40.0]}}
    ]}"#;
    std::fs::write(dir.path().join("all_day.geojson"), doc).unwrap();

    let worker = FetchWorker::new(Arc::new(DirectoryFeed::new(dir.path())));
    let mut session = FeedSession::default();
    worker.dispatch(session.refresh());
    assert_eq!(worker.pump_blocking(&mut session, WAIT), Some(true));

    session.set_magnitude_floor(4.0).unwrap();
    session.set_sort_key(SortKey::Magnitude);

    let mags: Vec<f64> = session.view().iter().map(|e| e.magnitude).collect();
    assert_eq!(mags, vec![6.2, 4.9]);

    let stats = session.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.band_count(MagnitudeBand::Major), 1);
    assert_eq!(stats.band_count(MagnitudeBand::Moderate), 1);
    assert_eq!(stats.band_count(MagnitudeBand::Light), 1);
    assert_eq!(stats.band_count(MagnitudeBand::Minor), 0);
    assert!((stats.average_magnitude - 4.733).abs() < 1e-3);
    assert_eq!(stats.by_region.get("Japan"), Some(&1));
    assert_eq!(stats.by_region.get("Ridgecrest"), Some(&1));
}
