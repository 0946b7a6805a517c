//! Core Kernel - Shared port abstractions for the body measurements store
//!
//! This crate provides the building blocks used by the domain and adapter crates:
//! - The `QueryClient` port for table-oriented backends
//! - Port error types and health check contracts
//! - Record identifier generation

pub mod ports;
pub mod query;
pub mod identifiers;

pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use query::{QueryClient, SelectQuery, Filter, Order, Direction, Row};
pub use identifiers::{generate_record_id, is_record_id};
