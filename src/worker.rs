use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crate::data::feed::{FeedSource, FetchError};
use crate::data::model::EventRecord;
use crate::session::{FeedSession, FetchTicket};

type Completion = (FetchTicket, Result<Vec<EventRecord>, FetchError>);

/// Runs feed fetches on background threads and hands the outcomes back to
/// the thread that owns the [`FeedSession`].
///
/// Nothing is cancelled: every dispatched fetch runs to completion, and the
/// session discards outcomes whose ticket has been superseded.
pub struct FetchWorker {
    source: Arc<dyn FeedSource>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    on_complete: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl FetchWorker {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            on_complete: None,
        }
    }

    /// Hook called from the worker thread after each completion, e.g. to
    /// wake up a UI event loop.
    pub fn with_wakeup(mut self, wakeup: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(wakeup));
        self
    }

    /// Start fetching for `ticket` in the background.
    pub fn dispatch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let wakeup = self.on_complete.clone();

        std::thread::spawn(move || {
            let outcome = source.fetch(ticket.range);
            if tx.send((ticket, outcome)).is_err() {
                log::debug!("Worker gone before {} fetch completed", ticket.range);
                return;
            }
            if let Some(wakeup) = wakeup {
                wakeup();
            }
        });
    }

    /// Dispatch when an operation produced a ticket.
    pub fn dispatch_opt(&self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            self.dispatch(ticket);
        }
    }

    /// Apply every completion that has already arrived. Returns how many of
    /// them the session accepted.
    pub fn pump(&self, session: &mut FeedSession) -> usize {
        let mut applied = 0;
        while let Ok((ticket, outcome)) = self.rx.try_recv() {
            if session.complete_fetch(ticket, outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait up to `timeout` for the next completion and apply it. Returns
    /// `Some(accepted)` for a received completion, `None` on timeout.
    pub fn pump_blocking(&self, session: &mut FeedSession, timeout: Duration) -> Option<bool> {
        // `self` holds a sender, so the channel never disconnects.
        match self.rx.recv_timeout(timeout) {
            Ok((ticket, outcome)) => Some(session.complete_fetch(ticket, outcome)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
