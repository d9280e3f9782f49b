//! LLM extraction layer.
//!
//! This module provides:
//! * [`PromptBuilder`] — renders the fixed intent-extraction prompt.
//! * [`LlmGateway`] — async trait implemented by completion backends.
//! * [`OllamaGateway`] — Ollama `/api/generate` gateway (reqwest).
//! * [`parser`] — pulls a JSON intent object out of free-form model text.
//! * [`LlmError`] — error variants for gateway failures.

pub mod gateway;
pub mod parser;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use gateway::{LlmError, LlmGateway, OllamaGateway, REQUEST_TIMEOUT};
pub use parser::{parse, Extraction};
pub use prompt::PromptBuilder;
