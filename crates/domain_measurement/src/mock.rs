//! In-memory `QueryClient` for tests
//!
//! Behaves like a PostgREST table: inserts receive a server id and
//! `created_at`, selects honour filters, ordering and limit, updates merge the
//! given columns into every matching row, and deletes of missing rows succeed.
//! Uniqueness is only enforced for tables registered with `with_unique_key`.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use core_kernel::{DomainPort, Filter, PortError, QueryClient, Row, SelectQuery};

/// In-memory table store implementing `QueryClient`
#[derive(Debug, Default)]
pub struct InMemoryQueryClient {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unique_keys: HashMap<String, Vec<String>>,
}

impl InMemoryQueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforces uniqueness of `columns` in `table`, like a backend unique constraint
    pub fn with_unique_key(mut self, table: &str, columns: &[&str]) -> Self {
        self.unique_keys.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Pre-populates a table with rows stored exactly as given
    pub async fn seed(&self, table: &str, rows: Vec<Row>) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Returns a snapshot of a table in insertion order
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn violates_unique_key(&self, table: &str, rows: &[Row], candidate: &Row) -> bool {
        match self.unique_keys.get(table) {
            Some(columns) => rows
                .iter()
                .any(|existing| same_key(existing, candidate, columns.as_slice())),
            None => false,
        }
    }
}

fn same_key<S: AsRef<str>>(a: &Row, b: &Row, columns: &[S]) -> bool {
    columns
        .iter()
        .all(|c| a.get(c.as_ref()).is_some() && a.get(c.as_ref()) == b.get(c.as_ref()))
}

fn stamp_server_columns(row: &mut Row) {
    if !matches!(row.get("id"), Some(Value::String(_))) {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    if !matches!(row.get("created_at"), Some(Value::String(_))) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        row.insert("created_at".to_string(), Value::String(now));
    }
}

fn merge(target: &mut Row, changes: &Row) {
    for (column, value) in changes {
        target.insert(column.clone(), value.clone());
    }
}

impl DomainPort for InMemoryQueryClient {}

#[async_trait]
impl QueryClient for InMemoryQueryClient {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Row>, PortError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        rows.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(&self, table: &str, row: Row, filters: &[Filter]) -> Result<Row, PortError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let mut first = None;
        for existing in rows.iter_mut().filter(|r| filters.iter().all(|f| f.matches(r))) {
            merge(existing, &row);
            if first.is_none() {
                first = Some(existing.clone());
            }
        }

        first.ok_or_else(|| {
            let key = filters.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("&");
            PortError::not_found(table, key)
        })
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, PortError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        if self.violates_unique_key(table, rows.as_slice(), &row) {
            return Err(PortError::conflict(format!(
                "duplicate key value violates unique constraint on {}",
                table
            )));
        }

        stamp_server_columns(&mut row);
        rows.push(row.clone());
        Ok(row)
    }

    async fn upsert(&self, table: &str, mut row: Row, on_conflict: &[&str]) -> Result<Row, PortError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        if let Some(existing) = rows.iter_mut().find(|r| same_key(r, &row, on_conflict)) {
            merge(existing, &row);
            return Ok(existing.clone());
        }

        stamp_server_columns(&mut row);
        rows.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !filters.iter().all(|f| f.matches(r)));
        }
        Ok(())
    }
}
