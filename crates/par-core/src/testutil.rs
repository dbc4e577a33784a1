//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{FetchRequest, FetchResult, PlayerRow, TableFragment};
use crate::schema::ColumnSet;
use crate::season::{RunEvent, RunReporter};
use crate::traits::{Fetcher, TableReader};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that replays a queue of responses and records requests.
#[derive(Clone)]
pub struct MockFetcher {
    /// Each call pops the first element. If empty, returns `fallback`.
    responses: Arc<Mutex<Vec<Result<FetchResult, AppError>>>>,
    fallback: FetchResult,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn with_responses(responses: Vec<Result<FetchResult, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            fallback: FetchResult::new(200, "<html><body>default</body></html>"),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answers 200 with `html`.
    pub fn ok_html(html: &str) -> Self {
        let mut fetcher = Self::with_responses(vec![]);
        fetcher.fallback = FetchResult::new(200, html);
        fetcher
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.fallback.clone())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockTableReader
// ---------------------------------------------------------------------------

/// Mock reader: every table id is found unless listed as missing; parsing
/// succeeds only for accepted column set names.
#[derive(Clone, Default)]
pub struct MockTableReader {
    accepted: Arc<Mutex<HashMap<String, Vec<PlayerRow>>>>,
    missing_tables: Arc<Mutex<HashSet<String>>>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl MockTableReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsing against the set named `set_name` returns `rows`.
    pub fn accepting(self, set_name: &str, rows: Vec<PlayerRow>) -> Self {
        self.accepted
            .lock()
            .unwrap()
            .insert(set_name.to_string(), rows);
        self
    }

    pub fn without_table(self, table_id: &str) -> Self {
        self.missing_tables
            .lock()
            .unwrap()
            .insert(table_id.to_string());
        self
    }

    /// Column set names passed to `parse`, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl TableReader for MockTableReader {
    fn extract(&self, _html: &str, table_id: &str) -> Result<TableFragment, AppError> {
        if self.missing_tables.lock().unwrap().contains(table_id) {
            return Err(AppError::ExtractionError(format!(
                "table '{table_id}' not found"
            )));
        }
        Ok(TableFragment {
            table_id: table_id.to_string(),
            html: format!("<table id=\"{table_id}\"></table>"),
        })
    }

    fn parse(
        &self,
        _fragment: &TableFragment,
        columns: &ColumnSet,
    ) -> Result<Vec<PlayerRow>, AppError> {
        self.attempts.lock().unwrap().push(columns.name.to_string());
        self.accepted
            .lock()
            .unwrap()
            .get(columns.name)
            .cloned()
            .ok_or_else(|| AppError::SchemaMismatch(format!("mock rejects {}", columns.name)))
    }
}

// ---------------------------------------------------------------------------
// MockRunReporter
// ---------------------------------------------------------------------------

/// Mock run reporter that records event names.
#[derive(Default)]
pub struct MockRunReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockRunReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunReporter for MockRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        let label = match &event {
            RunEvent::SeasonStarted { .. } => "SeasonStarted",
            RunEvent::SeasonCompleted { .. } => "SeasonCompleted",
            RunEvent::SeasonFailed { .. } => "SeasonFailed",
            RunEvent::Finished { .. } => "Finished",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}
