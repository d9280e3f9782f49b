//! Voice intent bridge — MQTT transcriptions in, structured intents out.
//!
//! A bus-to-HTTP-to-bus service for home automation: raw speech
//! transcriptions arrive on one MQTT topic, a locally hosted LLM turns each
//! one into a structured intent record, and the result is published on a
//! second topic with at-least-once delivery.
//!
//! # Architecture
//!
//! ```text
//! MQTT voice/text ──▶ BusClient ──bounded queue──▶ IntentPipeline
//!                                                     │
//!                                       PromptBuilder │ OllamaGateway
//!                                                     │ parser
//!                                                     ▼
//!                     MqttPublisher ◀───────────── IntentResult
//!                          │
//!                          └──▶ MQTT voice/intent (QoS 1)
//! ```
//!
//! The bus connection reconnects forever on a fixed delay; an unreachable
//! LLM drops individual messages; unparsable model output degrades to the
//! `unknown` fallback record instead of failing.

pub mod bus;
pub mod config;
pub mod intent;
pub mod llm;
pub mod pipeline;
