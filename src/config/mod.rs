//! Configuration module for the voice intent bridge.
//!
//! Provides `BridgeConfig` (top-level settings) with sub-configs for the LLM
//! endpoint and the MQTT bus, loaded from the environment via
//! `BridgeConfig::from_env`.

pub mod settings;

pub use settings::{BridgeConfig, BusConfig, LlmConfig};
