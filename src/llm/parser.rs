//! Response parser — digs a JSON intent object out of free-form model text.
//!
//! Models rarely return bare JSON even when told to. The extraction rule is
//! deliberately blunt: take the span from the first `{` to the last `}` and
//! strict-parse it. Anything that fails — no braces, unbalanced span, JSON
//! that is not an intent object — becomes the `unknown` fallback carrying the
//! original text in `raw_response`. The fallback is not an error; it is
//! published downstream like any other result.

use crate::intent::IntentResult;

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Tagged outcome of parsing one model response.
///
/// `Valid` carries the model's object with its values untouched — confidence
/// is not clamped and entity values keep whatever type the model gave them.
/// `Malformed` keeps the complete original text so it can be attached to the
/// fallback record.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Valid(IntentResult),
    Malformed { raw: String },
}

impl Extraction {
    pub fn is_valid(&self) -> bool {
        matches!(self, Extraction::Valid(_))
    }

    /// Collapse into the record that gets published: the parsed object, or
    /// the `unknown` fallback built from the raw text.
    pub fn into_result(self) -> IntentResult {
        match self {
            Extraction::Valid(result) => result,
            Extraction::Malformed { raw } => IntentResult::unknown(raw),
        }
    }
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

/// Parse raw model output into a tagged [`Extraction`].
///
/// Never fails: every input maps to either `Valid` or `Malformed`. An object
/// that parses as JSON but lacks a usable `intent` (missing, wrong type, or
/// empty) counts as malformed — `intent` must never be empty downstream.
pub fn parse(raw: &str) -> Extraction {
    let parsed = json_span(raw).and_then(|span| serde_json::from_str::<IntentResult>(span).ok());

    match parsed {
        Some(result) if !result.intent.is_empty() => Extraction::Valid(result),
        _ => Extraction::Malformed {
            raw: raw.to_string(),
        },
    }
}

/// The substring from the first `{` to the last `}`, inclusive, when the
/// first precedes the last.
fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start < end {
        Some(&raw[start..=end])
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
