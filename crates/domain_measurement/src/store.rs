//! Measurement store
//!
//! `MeasurementStore` turns domain requests into `QueryClient` calls against
//! the `body_measurements` table and maps the rows back into
//! `BodyMeasurement` records.
//!
//! # Saving
//!
//! A user has at most one record per day. With the default
//! `SaveStrategy::CheckThenWrite`, saving first looks for a record with the
//! same `(client_id, date)`, then updates it or inserts a new one. The two
//! steps are separate backend calls: two concurrent saves for the same new
//! day can both insert, leaving duplicate rows. `SaveStrategy::AtomicUpsert`
//! issues one conditional write instead and needs a unique constraint on
//! `(client_id, date)` in the backend.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use core_kernel::{Filter, PortError, QueryClient, Row, SelectQuery};

use crate::dto::BodyMeasurementDto;
use crate::error::{Operation, StoreError, StoreResult};
use crate::measurement::BodyMeasurement;

/// Backend table holding measurement rows
pub const TABLE: &str = "body_measurements";

const ID: &str = "id";
const CLIENT_ID: &str = "client_id";
const DATE: &str = "date";
const CREATED_AT: &str = "created_at";

/// How `save_measurement` writes a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStrategy {
    /// Select by `(client_id, date)`, then update or insert
    #[default]
    CheckThenWrite,
    /// Single upsert keyed on `(client_id, date)`
    AtomicUpsert,
}

/// Repository for body measurement records
#[derive(Clone)]
pub struct MeasurementStore {
    client: Arc<dyn QueryClient>,
    strategy: SaveStrategy,
}

impl fmt::Debug for MeasurementStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasurementStore")
            .field("table", &TABLE)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl MeasurementStore {
    /// Creates a store using the check-then-write save strategy
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self {
            client,
            strategy: SaveStrategy::default(),
        }
    }

    /// Sets the save strategy
    pub fn with_strategy(mut self, strategy: SaveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> SaveStrategy {
        self.strategy
    }

    /// Returns the user's most recent measurement, or `None` if they have none
    ///
    /// Records are ranked by `date`, newest first. Records sharing a date are
    /// ranked by `created_at`, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_latest_measurement(&self, user_id: &str) -> StoreResult<Option<BodyMeasurement>> {
        let query = history_query(user_id).limit(1);

        let rows = self
            .client
            .select(TABLE, query)
            .await
            .map_err(|e| failure(Operation::GetLatest, e))?;

        match rows.into_iter().next() {
            Some(row) => {
                let measurement = decode(row).map_err(|e| failure(Operation::GetLatest, e))?;
                debug!(measurement_id = %measurement.id, date = %measurement.date, "Found latest measurement");
                Ok(Some(measurement))
            }
            None => {
                debug!("No measurements recorded");
                Ok(None)
            }
        }
    }

    /// Returns the user's full measurement history, newest first
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_all_measurements(&self, user_id: &str) -> StoreResult<Vec<BodyMeasurement>> {
        let rows = self
            .client
            .select(TABLE, history_query(user_id))
            .await
            .map_err(|e| failure(Operation::GetAll, e))?;

        debug!(count = rows.len(), "Fetched measurement history");

        rows.into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| failure(Operation::GetAll, e))
    }

    /// Saves the measurement as the user's record for its date
    ///
    /// Overwrites every field of an existing record for `(client_id, date)`,
    /// or inserts a new one. Returns the record as persisted, including the
    /// server-assigned `id` and `created_at`.
    #[instrument(
        skip(self, measurement),
        fields(user_id = %measurement.client_id, date = %measurement.date, strategy = ?self.strategy)
    )]
    pub async fn save_measurement(&self, measurement: &BodyMeasurement) -> StoreResult<BodyMeasurement> {
        let result = match self.strategy {
            SaveStrategy::CheckThenWrite => self.check_then_write(measurement).await,
            SaveStrategy::AtomicUpsert => self.upsert(measurement).await,
        };

        let saved = result.map_err(|e| failure(Operation::Save, e))?;
        debug!(measurement_id = %saved.id, "Measurement saved");
        Ok(saved)
    }

    /// Deletes a measurement by id
    ///
    /// Succeeds whether or not a record with that id exists.
    #[instrument(skip(self), fields(measurement_id = %measurement_id))]
    pub async fn delete_measurement(&self, measurement_id: &str) -> StoreResult<()> {
        self.client
            .delete(TABLE, &[Filter::eq(ID, measurement_id)])
            .await
            .map_err(|e| failure(Operation::Delete, e))?;

        debug!("Measurement deleted");
        Ok(())
    }

    async fn check_then_write(&self, measurement: &BodyMeasurement) -> Result<BodyMeasurement, PortError> {
        let payload = write_payload(measurement)?;
        let day = [
            Filter::eq(CLIENT_ID, measurement.client_id.as_str()),
            Filter::eq(DATE, measurement.date.as_str()),
        ];

        let existing = self
            .client
            .select(
                TABLE,
                SelectQuery {
                    filters: day.to_vec(),
                    ..SelectQuery::default()
                },
            )
            .await?;

        let row = if existing.is_empty() {
            debug!("No record for this day, inserting");
            self.client.insert(TABLE, payload).await?
        } else {
            debug!(existing = existing.len(), "Record exists for this day, updating");
            self.client.update(TABLE, payload, &day).await?
        };

        decode(row)
    }

    async fn upsert(&self, measurement: &BodyMeasurement) -> Result<BodyMeasurement, PortError> {
        let payload = write_payload(measurement)?;
        let row = self
            .client
            .upsert(TABLE, payload, &[CLIENT_ID, DATE])
            .await?;
        decode(row)
    }
}

fn history_query(user_id: &str) -> SelectQuery {
    SelectQuery::new()
        .eq(CLIENT_ID, user_id)
        .order_desc(DATE)
        .order_desc(CREATED_AT)
}

fn write_payload(measurement: &BodyMeasurement) -> Result<Row, PortError> {
    BodyMeasurementDto::from(measurement).for_write().to_row()
}

fn decode(row: Row) -> Result<BodyMeasurement, PortError> {
    BodyMeasurementDto::try_from(row).map(BodyMeasurement::from)
}

fn failure(operation: Operation, source: PortError) -> StoreError {
    warn!(%operation, error = %source, "Measurement store operation failed");
    StoreError::failed(operation, source)
}
