//! verdict.rs — Classification value types and the decision normalizer.
//!
//! Everything here is a pure function of `(classification, confidence_score)`.
//! No I/O, no state; suitable for exhaustive boundary tests.

use serde::{Deserialize, Serialize};

/// Final verdict for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Scam,
    Legitimate,
}

/// Discrete confidence tier derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Step function over the 50–100 confidence score.
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            ConfidenceLevel::VeryHigh
        } else if score >= 75 {
            ConfidenceLevel::High
        } else if score >= 65 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Actionability tier driving the scam-log side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    None,
    Low,
    Medium,
    High,
}

impl AlertLevel {
    /// Legitimate messages never alert; scams tier on the confidence score.
    pub fn derive(classification: Classification, score: u8) -> Self {
        match classification {
            Classification::Legitimate => AlertLevel::None,
            Classification::Scam => {
                if score >= 80 {
                    AlertLevel::High
                } else if score >= 65 {
                    AlertLevel::Medium
                } else {
                    AlertLevel::Low
                }
            }
        }
    }
}

/// Which path produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    Llm,
    RuleBased,
}

/// Why the LLM path was abandoned, when it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackError {
    OllamaOffline,
    Timeout,
    Error,
}

/// Risk score in [0, 1], rounded to 3 decimals.
///
/// SCAM risk grows with confidence but is capped at 0.9; LEGITIMATE risk
/// shrinks with confidence and is floored at 0.05, so the UI never renders a
/// legitimate message as perfectly safe nor a scam as certain doom.
pub fn risk_score(classification: Classification, score: u8) -> f64 {
    let raw = match classification {
        Classification::Scam => (f64::from(score) / 100.0).min(0.9),
        Classification::Legitimate => ((100.0 - f64::from(score)) / 200.0).max(0.05),
    };
    (raw * 1000.0).round() / 1000.0
}

/// The value type flowing through the pipeline. Immutable after construction;
/// the API layer copies it into a response envelope rather than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classification: Classification,
    pub confidence_score: u8,
    pub confidence_level: ConfidenceLevel,
    pub risk_score: f64,
    pub reason: String,
    pub detection_method: DetectionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_error: Option<FallbackError>,
}

impl ClassificationResult {
    /// Build a result, deriving the normalized fields from the raw pair.
    /// The score is clamped into the 50–100 contract range.
    pub fn new(
        classification: Classification,
        confidence_score: u8,
        reason: impl Into<String>,
        detection_method: DetectionMethod,
    ) -> Self {
        let score = confidence_score.clamp(50, 100);
        Self {
            classification,
            confidence_score: score,
            confidence_level: ConfidenceLevel::from_score(score),
            risk_score: risk_score(classification, score),
            reason: reason.into(),
            detection_method,
            fallback_error: None,
        }
    }

    /// Tag the result with the error that pushed it onto the fallback path.
    pub fn with_fallback_error(mut self, err: FallbackError) -> Self {
        self.fallback_error = Some(err);
        self
    }

    pub fn alert_level(&self) -> AlertLevel {
        AlertLevel::derive(self.classification, self.confidence_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_level_boundaries() {
        // Exhaustive boundary pairs around each step.
        assert_eq!(ConfidenceLevel::from_score(64), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(65), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(74), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(75), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(84), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(85), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(100), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(50), ConfidenceLevel::Low);
    }

    #[test]
    fn scam_risk_tracks_confidence_capped() {
        assert!((risk_score(Classification::Scam, 85) - 0.85).abs() < 1e-9);
        assert!((risk_score(Classification::Scam, 75) - 0.75).abs() < 1e-9);
        // 95/100 and 100/100 both hit the 0.9 cap.
        assert!((risk_score(Classification::Scam, 95) - 0.9).abs() < 1e-9);
        assert!((risk_score(Classification::Scam, 100) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn legitimate_risk_inverts_confidence_floored() {
        assert!((risk_score(Classification::Legitimate, 60) - 0.2).abs() < 1e-9);
        assert!((risk_score(Classification::Legitimate, 80) - 0.1).abs() < 1e-9);
        // High confidence legit bottoms out at the floor.
        assert!((risk_score(Classification::Legitimate, 95) - 0.05).abs() < 1e-9);
        assert!((risk_score(Classification::Legitimate, 100) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn alert_level_boundaries() {
        assert_eq!(
            AlertLevel::derive(Classification::Scam, 79),
            AlertLevel::Medium
        );
        assert_eq!(
            AlertLevel::derive(Classification::Scam, 80),
            AlertLevel::High
        );
        assert_eq!(
            AlertLevel::derive(Classification::Scam, 64),
            AlertLevel::Low
        );
        assert_eq!(
            AlertLevel::derive(Classification::Scam, 65),
            AlertLevel::Medium
        );
        for score in [50u8, 60, 80, 100] {
            assert_eq!(
                AlertLevel::derive(Classification::Legitimate, score),
                AlertLevel::None
            );
        }
    }

    #[test]
    fn constructor_clamps_and_normalizes() {
        let r = ClassificationResult::new(
            Classification::Scam,
            120,
            "over-range input",
            DetectionMethod::Llm,
        );
        assert_eq!(r.confidence_score, 100);
        assert_eq!(r.confidence_level, ConfidenceLevel::VeryHigh);
        assert!((r.risk_score - 0.9).abs() < 1e-9);
        assert_eq!(r.alert_level(), AlertLevel::High);
    }

    #[test]
    fn serializes_wire_names() {
        let r = ClassificationResult::new(
            Classification::Scam,
            85,
            "test",
            DetectionMethod::RuleBased,
        )
        .with_fallback_error(FallbackError::OllamaOffline);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["classification"], "SCAM");
        assert_eq!(v["confidence_level"], "VERY_HIGH");
        assert_eq!(v["detection_method"], "RULE_BASED");
        assert_eq!(v["fallback_error"], "OLLAMA_OFFLINE");
    }

    #[test]
    fn fallback_error_omitted_when_absent() {
        let r = ClassificationResult::new(
            Classification::Legitimate,
            60,
            "test",
            DetectionMethod::Llm,
        );
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("fallback_error").is_none());
    }
}
