/// Debounced query execution.
///
/// Every issued query takes the next sequence number, waits out the debounce
/// delay, and is dropped if a newer query was issued meanwhile. Nothing is
/// cancelled: a stale query simply never delivers its results.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::model::{Corpus, SearchOptions, SearchResult};
use crate::search;

pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(300);

/// Sequence number of an issued query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryTicket(u64);

impl QueryTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

pub struct SearchSession {
    delay: Duration,
    issued: AtomicU64,
    completed: AtomicU64,
}

impl SearchSession {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            issued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: QueryTicket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Wait out the debounce delay. Returns `false` if the ticket was
    /// superseded in the meantime.
    pub async fn settle(&self, ticket: QueryTicket) -> bool {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let latest = self.is_latest(ticket);
        if !latest {
            debug!(sequence = ticket.0, "query superseded before execution");
        }
        latest
    }

    /// Mark a ticket's work as finished, stale or not.
    pub fn finish(&self, ticket: QueryTicket) {
        self.completed.fetch_max(ticket.0, Ordering::SeqCst);
    }

    /// True while the most recently issued query has not finished.
    pub fn is_searching(&self) -> bool {
        self.completed.load(Ordering::SeqCst) < self.issued.load(Ordering::SeqCst)
    }

    /// Issue, debounce and run a search. Returns `None` when a newer query
    /// superseded this one.
    pub async fn search(
        &self,
        corpus: &Corpus,
        options: &SearchOptions,
    ) -> Option<(QueryTicket, Vec<SearchResult>)> {
        let ticket = self.issue();
        if !self.settle(ticket).await {
            self.finish(ticket);
            return None;
        }
        let results = search::search(corpus, options);
        self.finish(ticket);
        self.is_latest(ticket).then_some((ticket, results))
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DELAY)
    }
}
