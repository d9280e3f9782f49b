//! Data model shared by the bus and pipeline layers.

pub mod types;

pub use types::{IntentResult, TranscriptionMessage, FALLBACK_INTENT};
