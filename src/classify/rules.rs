//! Rule-based fallback classifier.
//!
//! Deterministic keyword-count scoring used whenever the Ollama call fails.
//! Four disjoint scam-signal sets plus two legitimacy-signal lists; the
//! priority order of the rules is load-bearing (borderline messages change
//! classification if rules are reordered) and must stay as written.

use crate::verdict::{Classification, ClassificationResult, DetectionMethod, FallbackError};

/// Threats and urgency pressure.
const URGENT_THREATS: &[&str] = &[
    "urgent",
    "immediately",
    "suspended",
    "blocked",
    "deactivated",
    "final warning",
    "last chance",
    "legal action",
    "expires today",
    "within 24 hours",
];

/// Demands that the recipient do something right now.
const ACTION_DEMANDS: &[&str] = &[
    "click here",
    "click",
    "verify now",
    "act now",
    "call now",
    "reply now",
    "confirm your",
    "update your",
    "claim your",
    "send money",
];

/// Requests for credentials or identity data.
const SENSITIVE_REQUESTS: &[&str] = &[
    "ssn",
    "social security",
    "password",
    "pin number",
    "one time password",
    "otp code",
    "cvv",
    "card number",
    "bank account number",
    "aadhaar",
    "date of birth",
];

/// Names trusted brands and authorities commonly spoofed by scammers.
const IMPERSONATION: &[&str] = &[
    "irs",
    "income tax",
    "tax refund",
    "customs",
    "lottery",
    "prize",
    "winner",
    "you have won",
    "amazon security",
    "paypal",
    "your bank",
    "government",
];

/// Sender-id fragments of known legitimate senders (transactional SMS
/// headers, carriers, common services). Matched as substrings of the
/// normalized sender id.
const LEGITIMATE_SENDERS: &[&str] = &[
    "hdfcbk", "sbiinb", "icicib", "axisbk", "kotakb", "amazon", "flipkart", "paytm", "phonepe",
    "gpay", "swiggy", "zomato", "airtel", "jio", "bsnl", "irctc", "uidai",
];

/// Phrases typical of routine transactional messages.
const LEGITIMATE_PHRASES: &[&str] = &[
    "has been credited",
    "has been debited",
    "order has been shipped",
    "out for delivery",
    "has been delivered",
    "recharge successful",
    "booking confirmed",
    "appointment",
    "is your verification code",
    "thank you for shopping",
    "monthly statement",
];

/// Count matched keywords, ignoring a match that is merely a substring of a
/// longer matched keyword in the same set ("click here" subsumes "click"), so
/// one phrase never counts twice toward the rule-2 threshold.
fn count_hits(text: &str, set: &[&str]) -> usize {
    let matched: Vec<&str> = set.iter().copied().filter(|kw| text.contains(kw)).collect();
    matched
        .iter()
        .filter(|kw| {
            !matched
                .iter()
                .any(|other| other.len() > kw.len() && other.contains(**kw))
        })
        .count()
}

fn any_hit(text: &str, set: &[&str]) -> bool {
    set.iter().any(|kw| text.contains(*kw))
}

/// Classify without the model. `error_kind` records why the model path was
/// skipped and travels with the result so consumers can tell "model said
/// legitimate" apart from "model was unreachable".
pub fn classify_fallback(
    message: &str,
    sender: &str,
    error_kind: FallbackError,
) -> ClassificationResult {
    let text = message.to_lowercase();
    let sender_norm = sender.trim().to_lowercase();

    let urgent = count_hits(&text, URGENT_THREATS);
    let action = count_hits(&text, ACTION_DEMANDS);
    let sensitive = count_hits(&text, SENSITIVE_REQUESTS);
    let impersonation = count_hits(&text, IMPERSONATION);
    let total = urgent + action + sensitive + impersonation;

    // Rule 1: a sensitive-data request corroborated by pressure is the
    // strongest signal the rule engine can produce.
    let result = if sensitive >= 1 && (urgent >= 1 || action >= 1) {
        ClassificationResult::new(
            Classification::Scam,
            85,
            "Sensitive information request combined with urgency or action pressure",
            DetectionMethod::RuleBased,
        )
    // Rule 2: enough weaker signals stacked together.
    } else if total >= 3 {
        ClassificationResult::new(
            Classification::Scam,
            75,
            format!("Multiple scam indicators found ({total} keyword matches)"),
            DetectionMethod::RuleBased,
        )
    // Rule 3: recognized sender or routine transactional content.
    } else if any_hit(&sender_norm, LEGITIMATE_SENDERS) || any_hit(&text, LEGITIMATE_PHRASES) {
        ClassificationResult::new(
            Classification::Legitimate,
            80,
            "Sender or content matches known legitimate patterns",
            DetectionMethod::RuleBased,
        )
    // Rule 4: nothing conclusive either way; fail toward the quiet verdict.
    } else {
        ClassificationResult::new(
            Classification::Legitimate,
            60,
            "No strong scam indicators found",
            DetectionMethod::RuleBased,
        )
    };

    result.with_fallback_error(error_kind)
}
