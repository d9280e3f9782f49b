//! Wire types for the bridge: inbound transcriptions and outbound intents.
//!
//! Both types cross the MQTT bus as JSON. [`IntentResult`] additionally
//! round-trips model output: any extra keys the model put on its JSON object
//! are preserved through re-serialisation so downstream consumers see the
//! object exactly as the model produced it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved intent name used whenever extraction cannot be performed.
pub const FALLBACK_INTENT: &str = "unknown";

// ---------------------------------------------------------------------------
// TranscriptionMessage
// ---------------------------------------------------------------------------

/// Inbound payload on the transcription topic.
///
/// Produced by the speech-to-text stage. `text` may be empty; empty
/// transcriptions are accepted here and skipped by the pipeline. A payload
/// without a `text` key fails deserialisation and is dropped at the bus layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionMessage {
    pub text: String,
}

// ---------------------------------------------------------------------------
// IntentResult
// ---------------------------------------------------------------------------

/// Outbound payload on the intent topic.
///
/// When the model's JSON parses, the values here are the model's values —
/// `confidence` is not clamped to [0.0, 1.0] and entity values are not forced
/// to be strings. Consumers must tolerate out-of-range or oddly typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Canonical action category (e.g. `"toggle_device"`). Never empty;
    /// [`FALLBACK_INTENT`] when extraction failed.
    pub intent: String,
    /// Model-reported confidence. Nominally 0.0 – 1.0, passed through as-is.
    pub confidence: f64,
    /// Named attributes extracted alongside the intent.
    #[serde(default)]
    pub entities: Map<String, Value>,
    /// Original model output, attached to fallback results for downstream
    /// diagnosis. Omitted from JSON when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Any further keys the model emitted, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IntentResult {
    /// The deterministic fallback record: `unknown` intent, zero confidence,
    /// no entities, original model output attached.
    pub fn unknown(raw_response: impl Into<String>) -> Self {
        Self {
            intent: FALLBACK_INTENT.to_string(),
            confidence: 0.0,
            entities: Map::new(),
            raw_response: Some(raw_response.into()),
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_has_reserved_shape() {
        let result = IntentResult::unknown("I cannot determine this.");

        assert_eq!(result.intent, FALLBACK_INTENT);
        assert_eq!(result.confidence, 0.0);
        assert!(result.entities.is_empty());
        assert_eq!(
            result.raw_response.as_deref(),
            Some("I cannot determine this.")
        );
    }

    #[test]
    fn fallback_serialises_with_raw_response() {
        let result = IntentResult::unknown("garbage");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            json!({
                "intent": "unknown",
                "confidence": 0.0,
                "entities": {},
                "raw_response": "garbage"
            })
        );
    }

    #[test]
    fn raw_response_is_omitted_when_absent() {
        let result: IntentResult = serde_json::from_value(json!({
            "intent": "get_time",
            "confidence": 0.8
        }))
        .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"intent": "get_time", "confidence": 0.8, "entities": {}}));
    }

    /// Keys outside the known schema must survive a parse → serialise round
    /// trip untouched.
    #[test]
    fn extra_keys_round_trip() {
        let original = json!({
            "intent": "play_music",
            "confidence": 0.7,
            "entities": {"artist": "Mars Volta"},
            "model_notes": "guessed from context"
        });

        let parsed: IntentResult = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(parsed.extra.get("model_notes").unwrap(), "guessed from context");

        assert_eq!(serde_json::to_value(&parsed).unwrap(), original);
    }

    /// Entity values are not forced to be strings.
    #[test]
    fn non_string_entity_values_are_tolerated() {
        let parsed: IntentResult = serde_json::from_value(json!({
            "intent": "set_brightness",
            "confidence": 0.9,
            "entities": {"brightness_level": 80}
        }))
        .unwrap();

        assert_eq!(parsed.entities.get("brightness_level").unwrap(), 80);
    }

    #[test]
    fn transcription_requires_text_key() {
        assert!(serde_json::from_str::<TranscriptionMessage>(r#"{"text":"hi"}"#).is_ok());
        assert!(serde_json::from_str::<TranscriptionMessage>(r#"{"other":"hi"}"#).is_err());
    }
}
