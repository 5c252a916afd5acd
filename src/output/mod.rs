//! Ledger, progress and JSON output.

mod envelope;
mod ledger;
mod progress;

pub use envelope::{EventType, JsonEnvelope, emit_json};
pub use ledger::{ClassificationRecord, Ledger, read_ledger};
pub use progress::{create_image_progress, finish_progress, inc_progress};
