//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! body measurements test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built measurement records and rows
//! - `builders`: Builder for measurement test data
//! - `clients`: Fault-injecting `QueryClient` wrappers
//! - `assertions`: Assertion helpers for measurement histories
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod clients;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use clients::*;
pub use assertions::*;
pub use generators::*;
