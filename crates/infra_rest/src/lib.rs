//! Infrastructure REST Layer
//!
//! This crate provides the `QueryClient` adapter for a PostgREST backend as
//! exposed by Supabase, together with its configuration and tracing setup.
//!
//! # Architecture
//!
//! `RestQueryClient` translates `QueryClient` calls into PostgREST requests
//! against `{url}/rest/v1/{table}`, and maps HTTP failures onto `PortError`
//! so repositories never see transport details.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_rest::{RestConfig, RestQueryClient};
//! use domain_measurement::MeasurementStore;
//! use std::sync::Arc;
//!
//! let config = RestConfig::from_env(false)?;
//! infra_rest::init_tracing(&config.log_level).ok();
//!
//! let client = RestQueryClient::new(config)?;
//! let store = MeasurementStore::new(Arc::new(client));
//! ```

pub mod config;
pub mod error;
pub mod client;
pub mod telemetry;

pub use crate::config::RestConfig;
pub use crate::error::ConfigError;
pub use crate::client::RestQueryClient;
pub use crate::telemetry::init_tracing;
