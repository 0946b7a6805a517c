//! Query Client Test Doubles
//!
//! Wrappers around a real `QueryClient` (usually `InMemoryQueryClient`) that
//! record calls, inject failures, or hold selects at a barrier so tests can
//! reproduce interleavings deterministically.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

use core_kernel::{DomainPort, Filter, PortError, QueryClient, Row, SelectQuery};

/// The kind of `QueryClient` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCall {
    Select,
    Update,
    Insert,
    Upsert,
    Delete,
}

/// Records the sequence of calls made through it
pub struct RecordingQueryClient {
    inner: Arc<dyn QueryClient>,
    calls: Mutex<Vec<QueryCall>>,
}

impl RecordingQueryClient {
    pub fn new(inner: Arc<dyn QueryClient>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the calls made so far, oldest first
    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: QueryCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl DomainPort for RecordingQueryClient {}

#[async_trait]
impl QueryClient for RecordingQueryClient {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Row>, PortError> {
        self.record(QueryCall::Select);
        self.inner.select(table, query).await
    }

    async fn update(&self, table: &str, row: Row, filters: &[Filter]) -> Result<Row, PortError> {
        self.record(QueryCall::Update);
        self.inner.update(table, row, filters).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, PortError> {
        self.record(QueryCall::Insert);
        self.inner.insert(table, row).await
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row, PortError> {
        self.record(QueryCall::Upsert);
        self.inner.upsert(table, row, on_conflict).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), PortError> {
        self.record(QueryCall::Delete);
        self.inner.delete(table, filters).await
    }
}

type ErrorFactory = Arc<dyn Fn() -> PortError + Send + Sync>;

/// Fails one kind of call with a configured error and forwards the rest
pub struct FailingQueryClient {
    inner: Arc<dyn QueryClient>,
    failing: QueryCall,
    make_error: ErrorFactory,
}

impl FailingQueryClient {
    /// Fails every `failing` call with the error produced by `make_error`
    pub fn new(
        inner: Arc<dyn QueryClient>,
        failing: QueryCall,
        make_error: impl Fn() -> PortError + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            failing,
            make_error: Arc::new(make_error),
        }
    }

    fn check(&self, call: QueryCall) -> Result<(), PortError> {
        if call == self.failing {
            Err((self.make_error)())
        } else {
            Ok(())
        }
    }
}

impl DomainPort for FailingQueryClient {}

#[async_trait]
impl QueryClient for FailingQueryClient {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Row>, PortError> {
        self.check(QueryCall::Select)?;
        self.inner.select(table, query).await
    }

    async fn update(&self, table: &str, row: Row, filters: &[Filter]) -> Result<Row, PortError> {
        self.check(QueryCall::Update)?;
        self.inner.update(table, row, filters).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, PortError> {
        self.check(QueryCall::Insert)?;
        self.inner.insert(table, row).await
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row, PortError> {
        self.check(QueryCall::Upsert)?;
        self.inner.upsert(table, row, on_conflict).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), PortError> {
        self.check(QueryCall::Delete)?;
        self.inner.delete(table, filters).await
    }
}

/// Holds the first `parties` selects at a barrier until all of them have read
///
/// Every held select observes the table before any of the callers can write,
/// which is the interleaving that defeats a check-then-write save. Later
/// selects pass straight through.
pub struct RacingQueryClient {
    inner: Arc<dyn QueryClient>,
    barrier: Barrier,
    parties: usize,
    held: AtomicUsize,
}

impl RacingQueryClient {
    pub fn new(inner: Arc<dyn QueryClient>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            held: AtomicUsize::new(0),
        }
    }
}

impl DomainPort for RacingQueryClient {}

#[async_trait]
impl QueryClient for RacingQueryClient {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Row>, PortError> {
        let rows = self.inner.select(table, query).await?;
        if self.held.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        Ok(rows)
    }

    async fn update(&self, table: &str, row: Row, filters: &[Filter]) -> Result<Row, PortError> {
        self.inner.update(table, row, filters).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, PortError> {
        self.inner.insert(table, row).await
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row, PortError> {
        self.inner.upsert(table, row, on_conflict).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), PortError> {
        self.inner.delete(table, filters).await
    }
}
