//! Service settings, defaults and environment loading.
//!
//! Configuration is read once at startup from the environment; every value
//! has a default matching the conventional homelab deployment (Ollama and
//! Mosquitto reachable by container name). A numeric variable that fails to
//! parse is a startup error, not a silent fallback.

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Hostname of the Ollama instance.
    pub host: String,
    /// Port of the Ollama instance.
    pub port: u16,
    /// Model identifier sent with every request (e.g. `"phi"`).
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: "ollama-cpu".into(),
            port: 11434,
            model: "phi".into(),
        }
    }
}

impl LlmConfig {
    /// Base URL of the endpoint, e.g. `http://ollama-cpu:11434`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// BusConfig
// ---------------------------------------------------------------------------

/// Connection and topic settings for the MQTT broker.
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    /// Inbound topic carrying raw transcriptions.
    pub topic_text: String,
    /// Outbound topic carrying structured intents.
    pub topic_intent: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "mosquitto".into(),
            port: 1883,
            topic_text: "voice/text".into(),
            topic_intent: "voice/intent".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BridgeConfig {
    pub llm: LlmConfig,
    pub bus: BusConfig,
}

impl BridgeConfig {
    /// Read configuration from the environment.
    ///
    /// Recognised variables: `OLLAMA_HOST`, `OLLAMA_PORT`, `OLLAMA_MODEL`,
    /// `MQTT_HOST`, `MQTT_PORT`, `MQTT_TOPIC_TEXT`, `MQTT_TOPIC_INTENT`.
    /// Unset variables fall back to defaults; malformed port values abort
    /// startup with a descriptive error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            llm: LlmConfig {
                host: env_or("OLLAMA_HOST", &defaults.llm.host),
                port: env_port("OLLAMA_PORT", defaults.llm.port)?,
                model: env_or("OLLAMA_MODEL", &defaults.llm.model),
            },
            bus: BusConfig {
                host: env_or("MQTT_HOST", &defaults.bus.host),
                port: env_port("MQTT_PORT", defaults.bus.port)?,
                topic_text: env_or("MQTT_TOPIC_TEXT", &defaults.bus.topic_text),
                topic_intent: env_or("MQTT_TOPIC_INTENT", &defaults.bus.topic_intent),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_port(key: &str, default: u16) -> Result<u16> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{key} must be a port number, got {value:?}")),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
