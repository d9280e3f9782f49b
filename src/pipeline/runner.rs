//! Pipeline worker — drives the transcription → prompt → LLM → publish loop.
//!
//! [`IntentPipeline`] drains the bounded work queue filled by the bus layer
//! and runs one extraction at a time.
//!
//! # Pipeline flow
//!
//! ```text
//! TranscriptionMessage (mpsc, bounded)
//!   └─▶ empty text?            → skip (no LLM call, nothing published)
//!   └─▶ PromptBuilder::build
//!         └─▶ LlmGateway::complete
//!               ├─ Err → log error, drop message (nothing published)
//!               └─ Ok  → parser::parse
//!                     ├─ Valid     → publish the model's object verbatim
//!                     └─ Malformed → publish the `unknown` fallback
//! ```
//!
//! The single worker preserves the at-most-one-extraction-in-flight
//! guarantee while the queue keeps inference latency off the bus loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bus::BusPublisher;
use crate::intent::TranscriptionMessage;
use crate::llm::{parser, Extraction, LlmGateway, PromptBuilder};

/// Capacity of the transcription work queue between the bus loop and the
/// worker. Overflow is dropped at the bus layer with a warning.
pub const QUEUE_CAPACITY: usize = 32;

// ---------------------------------------------------------------------------
// IntentPipeline
// ---------------------------------------------------------------------------

/// The extraction worker.
///
/// Holds the prompt template, the completion gateway and the publish handle;
/// both seams are trait objects so each stage tests in isolation.
pub struct IntentPipeline {
    prompt: PromptBuilder,
    gateway: Arc<dyn LlmGateway>,
    publisher: Arc<dyn BusPublisher>,
    topic_intent: String,
}

impl IntentPipeline {
    pub fn new(
        prompt: PromptBuilder,
        gateway: Arc<dyn LlmGateway>,
        publisher: Arc<dyn BusPublisher>,
        topic_intent: String,
    ) -> Self {
        Self {
            prompt,
            gateway,
            publisher,
            topic_intent,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the worker until the queue is closed.
    ///
    /// Spawned as a tokio task from `main()`; in normal operation the queue
    /// never closes and this never returns.
    pub async fn run(self, mut queue: mpsc::Receiver<TranscriptionMessage>) {
        while let Some(message) = queue.recv().await {
            self.handle(message).await;
        }

        log::info!("pipeline: work queue closed, worker shutting down");
    }

    // -----------------------------------------------------------------------
    // Per-message handling
    // -----------------------------------------------------------------------

    async fn handle(&self, message: TranscriptionMessage) {
        if message.text.is_empty() {
            log::debug!("pipeline: empty transcription, skipping");
            return;
        }

        log::info!("pipeline: processing transcription {:?}", message.text);

        // ── 1. Prompt + completion ───────────────────────────────────────
        let prompt = self.prompt.build(&message.text);

        let raw = match self.gateway.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                // Message is dropped: no fallback, nothing published.
                log::error!("pipeline: LLM call failed, dropping message: {e}");
                return;
            }
        };

        // ── 2. Parse (never fails — worst case is the fallback) ──────────
        let extraction = parser::parse(&raw);
        match &extraction {
            Extraction::Valid(result) => log::info!(
                "pipeline: extracted intent {:?} (confidence {})",
                result.intent,
                result.confidence
            ),
            Extraction::Malformed { .. } => {
                log::warn!("pipeline: could not parse intent JSON from model output, publishing fallback")
            }
        }

        // ── 3. Publish ───────────────────────────────────────────────────
        let result = extraction.into_result();
        let payload = match serde_json::to_vec(&result) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("pipeline: failed to serialise intent result: {e}");
                return;
            }
        };

        if let Err(e) = self.publisher.publish(&self.topic_intent, payload).await {
            // Logged, not retried.
            log::error!("pipeline: publish to {} failed: {e}", self.topic_intent);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
