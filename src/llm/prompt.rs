//! Prompt builder for intent extraction.
//!
//! [`PromptBuilder`] renders a fixed instruction template around the raw
//! transcription: the intent taxonomy with per-intent entity hints, the
//! transcription itself, and the required JSON output shape. The
//! transcription is embedded verbatim — no escaping is performed, so text
//! containing quotes or braces can alter the prompt structure. Accepted
//! limitation; the parser's fallback absorbs the damage.

// ---------------------------------------------------------------------------
// Template sections
// ---------------------------------------------------------------------------

const SYSTEM_INSTRUCTION: &str = "\
You are a voice assistant intent recognizer. Given user speech transcription, \
extract the intent and entities.

Respond ONLY with valid JSON (no other text).
";

/// The fixed intent vocabulary. Entity lists are instruction text only —
/// nothing enforces them structurally.
const INTENT_TAXONOMY: &str = "
Common intents:
- toggle_device: Toggle a device on/off (entities: device_name, location)
- set_brightness: Set brightness level (entities: device_name, location, brightness_level)
- set_temperature: Set temperature (entities: device_name, location, temperature_value)
- play_music: Play music (entities: artist, song_name, playlist)
- stop_music: Stop playing music
- get_weather: Get weather info (entities: location)
- get_time: Get current time
- set_reminder: Set a reminder (entities: reminder_text, time_or_duration)
- open_door: Open door/lock (entities: device_name)
- unknown: If intent cannot be determined
";

const RESPONSE_FORMAT: &str = "
Response format:
{
  \"intent\": \"<intent_name>\",
  \"confidence\": <0.0-1.0>,
  \"entities\": {\"<key>\": \"<value>\"}
}
";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the extraction prompt sent to the completion endpoint.
///
/// # Example
/// ```rust
/// use voice_intent_bridge::llm::PromptBuilder;
///
/// let builder = PromptBuilder::new();
/// let prompt = builder.build("turn on the light");
/// assert!(prompt.contains("turn on the light"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render the full prompt for one transcription.
    ///
    /// Structure (in order):
    /// 1. System instruction
    /// 2. Intent taxonomy with entity hints
    /// 3. The transcription, quoted
    /// 4. Required JSON response shape
    pub fn build(&self, text: &str) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(SYSTEM_INSTRUCTION);
        prompt.push_str(INTENT_TAXONOMY);
        prompt.push_str(&format!("\nUser speech: \"{}\"\n", text));
        prompt.push_str(RESPONSE_FORMAT);
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_the_full_taxonomy() {
        let prompt = PromptBuilder::new().build("hello");

        for intent in [
            "toggle_device",
            "set_brightness",
            "set_temperature",
            "play_music",
            "stop_music",
            "get_weather",
            "get_time",
            "set_reminder",
            "open_door",
            "unknown",
        ] {
            assert!(prompt.contains(intent), "taxonomy must list {intent}");
        }
    }

    #[test]
    fn prompt_embeds_transcription_verbatim() {
        let prompt = PromptBuilder::new().build("turn on the living room light");

        assert!(prompt.contains("User speech: \"turn on the living room light\""));
    }

    #[test]
    fn prompt_specifies_json_output_shape() {
        let prompt = PromptBuilder::new().build("anything");

        assert!(prompt.contains("Respond ONLY with valid JSON"));
        assert!(prompt.contains("\"intent\""));
        assert!(prompt.contains("\"confidence\""));
        assert!(prompt.contains("\"entities\""));
    }

    #[test]
    fn prompt_mentions_entity_hints() {
        let prompt = PromptBuilder::new().build("anything");

        assert!(prompt.contains("device_name"));
        assert!(prompt.contains("brightness_level"));
        assert!(prompt.contains("time_or_duration"));
    }

    /// The transcription is substituted without escaping — a quote in the
    /// input lands in the prompt as-is.
    #[test]
    fn no_escaping_is_performed() {
        let prompt = PromptBuilder::new().build(r#"say "hello" {now}"#);

        assert!(prompt.contains(r#"say "hello" {now}"#));
    }
}
