//! JSON envelope for machine-readable command output.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Current version of the envelope layout.
pub const SPEC_VERSION: &str = "1.0";

/// Envelope wrapping every JSON document printed to stdout.
#[derive(Debug, Serialize)]
pub struct JsonEnvelope<T> {
    /// Envelope layout version.
    pub spec_version: String,
    /// Time the document was produced.
    pub timestamp: DateTime<Utc>,
    /// What the payload describes.
    pub event: EventType,
    /// Command-specific payload.
    pub payload: T,
}

impl<T: Serialize> JsonEnvelope<T> {
    /// Wrap a payload with the current timestamp.
    pub fn new(event: EventType, payload: T) -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            timestamp: Utc::now(),
            event,
            payload,
        }
    }
}

/// Event types for JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A sort run finished.
    SortCompleted,
    /// A sort run was interrupted before the ledger was written.
    SortCancelled,
    /// Per-bucket image counts.
    Stats,
}

/// Print one envelope as a single JSON line on stdout.
pub fn emit_json<T: Serialize>(event: EventType, payload: T) -> Result<()> {
    let envelope = JsonEnvelope::new(event, payload);
    let line = serde_json::to_string(&envelope).map_err(|source| Error::JsonWrite { source })?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}
