//! Record identifiers
//!
//! Backends assign identifiers on insert. When a record arrives without one,
//! a local identifier is generated so every in-memory record carries an id.
//! Local ids are time-ordered UUIDs (v7) and are never sent back as authoritative.

use uuid::Uuid;

/// Generates a new time-ordered record identifier
pub fn generate_record_id() -> String {
    Uuid::now_v7().to_string()
}

/// Returns true if the value parses as a UUID
pub fn is_record_id(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}
