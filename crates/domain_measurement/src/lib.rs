//! Body Measurement Domain
//!
//! This crate persists and retrieves body measurement records (a user's
//! body-part measurements for a given day) through the `QueryClient` port.
//!
//! # Key Components
//!
//! - **BodyMeasurement**: The domain record, one per user per day
//! - **BodyMeasurementDto**: The wire form, named after the backend columns
//! - **MeasurementStore**: Latest, history, save-by-date and delete operations
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_measurement::{BodyMeasurement, BodyPart, MeasurementStore};
//!
//! let store = MeasurementStore::new(client);
//!
//! let mut today = BodyMeasurement::new("user-1", "2024-01-01");
//! today.set_part(BodyPart::Waist, Some(81.5));
//!
//! let saved = store.save_measurement(&today).await?;
//! let latest = store.get_latest_measurement("user-1").await?;
//! ```

pub mod measurement;
pub mod dto;
pub mod error;
pub mod store;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use measurement::{BodyMeasurement, BodyPart};
pub use dto::BodyMeasurementDto;
pub use error::{StoreError, StoreResult, Operation};
pub use store::{MeasurementStore, SaveStrategy, TABLE};
