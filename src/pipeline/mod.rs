//! Extraction pipeline: the worker that turns queued transcriptions into
//! published intents.

pub mod runner;

pub use runner::{IntentPipeline, QUEUE_CAPACITY};
