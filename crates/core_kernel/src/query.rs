//! Query Client Port
//!
//! This module defines the port through which repositories talk to a
//! table-oriented backend. The contract mirrors what a PostgREST-style query
//! layer offers: equality filters combined with AND, ordering on columns,
//! an optional row limit, and single-row write results.
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_kernel::{QueryClient, SelectQuery};
//!
//! let rows = client
//!     .select(
//!         "body_measurements",
//!         SelectQuery::new()
//!             .eq("client_id", "user-1")
//!             .order_desc("date")
//!             .limit(1),
//!     )
//!     .await?;
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::ports::{DomainPort, PortError};

/// A single backend row keyed by column name
pub type Row = Map<String, Value>;

/// Sort direction for an ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Returns the PostgREST token for this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// An equality predicate on a named column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// Creates an equality filter
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Returns true if the row holds exactly this value in the filtered column
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }

    /// Renders the filter value as it appears in a query string
    ///
    /// Strings are rendered without JSON quoting; everything else uses its
    /// JSON text form.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value_text())
    }
}

/// An ordering clause on a named column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }

    /// Compares two rows on this clause's column
    ///
    /// Missing or null values sort after present ones regardless of
    /// direction, matching the `NULLS LAST` default for descending order.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let left = a.get(&self.column).filter(|v| !v.is_null());
        let right = b.get(&self.column).filter(|v| !v.is_null());

        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = compare_values(l, r);
                match self.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            }
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.column, self.direction.as_str())
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Parameters for a select call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    /// Equality filters, combined with AND
    pub filters: Vec<Filter>,
    /// Ordering clauses, applied in sequence
    pub order: Vec<Order>,
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Adds an ascending ordering clause
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order::asc(column));
        self
    }

    /// Adds a descending ordering clause
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order::desc(column));
        self
    }

    /// Caps the number of rows returned
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the row satisfies every filter
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Compares two rows using the ordering clauses in sequence
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        self.order
            .iter()
            .map(|o| o.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Port for a table-oriented query backend
///
/// All operations are async and may fail with a transport- or backend-level
/// error reported as `PortError`. Implementations must not retry internally.
#[async_trait]
pub trait QueryClient: DomainPort {
    /// Returns the rows of `table` matching the query, in the requested order
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Row>, PortError>;

    /// Overwrites the given columns on every row matching `filters`
    ///
    /// Returns the first updated row, or `PortError::NotFound` if nothing matched.
    async fn update(&self, table: &str, row: Row, filters: &[Filter]) -> Result<Row, PortError>;

    /// Inserts a new row and returns it as stored, including server-set columns
    async fn insert(&self, table: &str, row: Row) -> Result<Row, PortError>;

    /// Inserts the row, or merges it into the existing row sharing the
    /// `on_conflict` columns, as one conditional write
    ///
    /// The backend must enforce uniqueness on `on_conflict` for the write to be atomic.
    async fn upsert(&self, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row, PortError>;

    /// Deletes every row matching `filters`; matching nothing is not an error
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), PortError>;
}
