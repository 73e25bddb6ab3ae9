//! Parser for the model's three-line reply contract:
//!
//! ```text
//! CLASSIFICATION: <SCAM|LEGITIMATE>
//! CONFIDENCE: <50-100>
//! REASON: <text>
//! ```
//!
//! Each field is extracted independently; a missing field gets a safe default
//! so a half-formed reply degrades toward LEGITIMATE rather than toward a
//! false alarm. A reply with no recognizable field at all drops into a
//! last-ditch keyword scan. That scan intentionally stays separate from the
//! rule-based classifier in `rules.rs`: this one handles "the model answered
//! gibberish", the other handles "the model never answered", and they score
//! differently.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::verdict::{Classification, ClassificationResult, DetectionMethod};

const DEFAULT_CONFIDENCE: u8 = 60;
const DEFAULT_REASON: &str = "Unable to parse AI response";

static CLASSIFICATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CLASSIFICATION:\s*(SCAM|LEGITIMATE)").expect("valid regex"));
static CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CONFIDENCE:\s*(\d{1,3})").expect("valid regex"));
static REASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)REASON:\s*(.+)$").expect("valid regex"));

/// Keywords for the last-ditch scan over unstructured model output.
const SCAN_KEYWORDS: &[&str] = &[
    "urgent",
    "suspended",
    "verify now",
    "click here",
    "act now",
    "winner",
    "prize",
    "ssn",
    "social security",
];

/// Turn raw model text into a result, tagged `detection_method = LLM`.
pub fn parse_model_reply(raw: &str, original_message: &str) -> ClassificationResult {
    let classification = CLASSIFICATION_RE
        .captures(raw)
        .map(|c| match c[1].to_ascii_uppercase().as_str() {
            "SCAM" => Classification::Scam,
            _ => Classification::Legitimate,
        });
    let confidence = CONFIDENCE_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<u8>().ok().or(Some(100)));
    let reason = REASON_RE
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .filter(|r| !r.is_empty());

    if classification.is_none() && confidence.is_none() && reason.is_none() {
        return keyword_scan(original_message);
    }

    ClassificationResult::new(
        classification.unwrap_or(Classification::Legitimate),
        confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(50, 100),
        reason.unwrap_or_else(|| DEFAULT_REASON.to_string()),
        DetectionMethod::Llm,
    )
}

/// Second-tier fallback: the model replied, but with nothing resembling the
/// contract. Scan the original message for blatant scam vocabulary.
fn keyword_scan(message: &str) -> ClassificationResult {
    let text = message.to_lowercase();
    let hits = SCAN_KEYWORDS.iter().filter(|kw| text.contains(*kw)).count();
    if hits >= 1 {
        ClassificationResult::new(
            Classification::Scam,
            65,
            format!("Unstructured AI reply; keyword scan found {hits} scam indicator(s)"),
            DetectionMethod::Llm,
        )
    } else {
        ClassificationResult::new(
            Classification::Legitimate,
            70,
            "Unstructured AI reply; keyword scan found no scam indicators",
            DetectionMethod::Llm,
        )
    }
}
