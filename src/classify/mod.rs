// src/classify/mod.rs
//! Classification pipeline: LLM path with rule-based fallback, watchlist
//! lookup, and the conditional scam-log side effect.

pub mod llm;
pub mod parser;
pub mod rules;

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::scamlog::ScamLogWriter;
use crate::verdict::{AlertLevel, Classification, ClassificationResult, DetectionMethod};
use crate::watchlist::{WatchlistEntry, WatchlistStore};

pub use llm::{build_prompt, FailingClient, InferenceClient, InferenceError, OllamaClient, StaticClient};

/// Maximum messages accepted per batch request.
pub const BATCH_LIMIT: usize = 5;

/// Caller-facing record: the classification plus response metadata.
/// The inner `ClassificationResult` is flattened so the wire shape matches
/// what the mobile client already consumes.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub alert_level: AlertLevel,
    pub sender: String,
    pub sender_on_watchlist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchlist_entry: Option<WatchlistEntry>,
    pub message_length: usize,
    pub timestamp: String,
    pub processed: bool,
}

/// Aggregate statistics for a batch response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    pub scam_count: usize,
    pub legitimate_count: usize,
    pub llm_used: usize,
    pub rules_used: usize,
    pub on_watchlist: usize,
}

pub struct Pipeline {
    inference: Arc<dyn InferenceClient>,
    watchlist: Arc<WatchlistStore>,
    scam_log: Arc<ScamLogWriter>,
}

impl Pipeline {
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        watchlist: Arc<WatchlistStore>,
        scam_log: Arc<ScamLogWriter>,
    ) -> Self {
        Self {
            inference,
            watchlist,
            scam_log,
        }
    }

    /// Classify one message. Never fails: transport errors degrade to the
    /// rule-based path and log errors are swallowed by the writer.
    pub async fn analyze(&self, message: &str, sender: &str) -> AnalysisRecord {
        let result = self.classify(message, sender).await;

        match result.detection_method {
            DetectionMethod::Llm => counter!("classifications_llm_total").increment(1),
            DetectionMethod::RuleBased => counter!("classifications_rules_total").increment(1),
        }
        if result.classification == Classification::Scam {
            counter!("classifications_scam_total").increment(1);
        }

        let alert_level = result.alert_level();
        if alert_level == AlertLevel::High {
            // Log the pipeline-level result, before response metadata is
            // attached.
            let analysis_json = serde_json::to_string(&result)
                .unwrap_or_else(|_| "{}".to_string());
            self.scam_log.append(sender, message, &analysis_json);
            counter!("scam_log_records_total").increment(1);
        }

        let watchlist_entry = self.watchlist.lookup(sender).cloned();

        info!(
            sender,
            classification = ?result.classification,
            confidence = result.confidence_score,
            method = ?result.detection_method,
            alert = ?alert_level,
            "message classified"
        );

        AnalysisRecord {
            sender_on_watchlist: watchlist_entry.is_some(),
            watchlist_entry,
            alert_level,
            sender: sender.to_string(),
            message_length: message.chars().count(),
            timestamp: Utc::now().to_rfc3339(),
            processed: true,
            result,
        }
    }

    /// Sequentially classify up to [`BATCH_LIMIT`] messages; rows with an
    /// empty message are skipped rather than rejected.
    pub async fn batch(&self, items: &[(String, String)]) -> (Vec<AnalysisRecord>, BatchStats) {
        let mut records = Vec::new();
        let mut stats = BatchStats::default();

        for (message, sender) in items.iter().take(BATCH_LIMIT) {
            if message.trim().is_empty() {
                continue;
            }
            let record = self.analyze(message, sender).await;
            match record.result.classification {
                Classification::Scam => stats.scam_count += 1,
                Classification::Legitimate => stats.legitimate_count += 1,
            }
            match record.result.detection_method {
                DetectionMethod::Llm => stats.llm_used += 1,
                DetectionMethod::RuleBased => stats.rules_used += 1,
            }
            if record.sender_on_watchlist {
                stats.on_watchlist += 1;
            }
            records.push(record);
        }

        (records, stats)
    }

    /// Two-path core: LLM with parser on success, rule engine on failure.
    async fn classify(&self, message: &str, sender: &str) -> ClassificationResult {
        let prompt = build_prompt(message, sender);
        match self.inference.generate(&prompt).await {
            Ok(raw) => parser::parse_model_reply(&raw, message),
            Err(err) => {
                warn!(sender, error = %err, "inference call failed; using rule-based fallback");
                counter!("inference_failures_total").increment(1);
                rules::classify_fallback(message, sender, err.as_fallback())
            }
        }
    }

    pub fn inference(&self) -> &Arc<dyn InferenceClient> {
        &self.inference
    }

    pub fn watchlist(&self) -> &Arc<WatchlistStore> {
        &self.watchlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::FallbackError;

    fn temp_log(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pipeline-test-{}-{tag}.csv", std::process::id()))
    }

    fn pipeline_with(client: Arc<dyn InferenceClient>, log_tag: &str) -> (Pipeline, std::path::PathBuf) {
        let path = temp_log(log_tag);
        std::fs::remove_file(&path).ok();
        let p = Pipeline::new(
            client,
            Arc::new(WatchlistStore::empty("+91")),
            Arc::new(ScamLogWriter::new(&path)),
        );
        (p, path)
    }

    #[tokio::test]
    async fn llm_success_uses_parsed_result() {
        let client = Arc::new(StaticClient::new(
            "CLASSIFICATION: SCAM\nCONFIDENCE: 90\nREASON: Credential phishing.",
        ));
        let (pipeline, path) = pipeline_with(client, "llm-ok");

        let record = pipeline.analyze("give me your password now", "+15550001").await;
        std::fs::remove_file(&path).ok();

        assert_eq!(record.result.detection_method, DetectionMethod::Llm);
        assert_eq!(record.result.classification, Classification::Scam);
        assert_eq!(record.result.confidence_score, 90);
        assert_eq!(record.alert_level, AlertLevel::High);
        assert!(record.result.fallback_error.is_none());
        assert!(record.processed);
    }

    #[tokio::test]
    async fn offline_inference_falls_back_to_rules() {
        let (pipeline, path) = pipeline_with(Arc::new(FailingClient::offline()), "offline");

        let record = pipeline
            .analyze(
                "URGENT! Account suspended. Click bit.ly/verify123 to restore access NOW!",
                "+1234567890",
            )
            .await;
        std::fs::remove_file(&path).ok();

        assert_eq!(record.result.detection_method, DetectionMethod::RuleBased);
        assert_eq!(record.result.classification, Classification::Scam);
        assert_eq!(record.result.confidence_score, 75);
        assert_eq!(
            record.result.fallback_error,
            Some(FallbackError::OllamaOffline)
        );
    }

    #[tokio::test]
    async fn high_alert_appends_exactly_one_log_record() {
        let client = Arc::new(StaticClient::new(
            "CLASSIFICATION: SCAM\nCONFIDENCE: 88\nREASON: Asks for OTP.",
        ));
        let (pipeline, path) = pipeline_with(client, "logged");

        pipeline.analyze("share your otp code now", "+15550002").await;

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        // header + one record
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().nth(1).unwrap().contains("+15550002"));
    }

    #[tokio::test]
    async fn medium_alert_does_not_log() {
        let client = Arc::new(StaticClient::new(
            "CLASSIFICATION: SCAM\nCONFIDENCE: 70\nREASON: Mildly suspicious.",
        ));
        let (pipeline, path) = pipeline_with(client, "unlogged");

        let record = pipeline.analyze("maybe a scam", "+15550003").await;

        assert_eq!(record.alert_level, AlertLevel::Medium);
        assert!(!path.exists(), "no log file expected for sub-HIGH alerts");
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn batch_caps_skips_empties_and_aggregates() {
        let client = Arc::new(StaticClient::new(
            "CLASSIFICATION: LEGITIMATE\nCONFIDENCE: 80\nREASON: Routine.",
        ));
        let (pipeline, path) = pipeline_with(client, "batch");

        let items: Vec<(String, String)> = vec![
            ("hello".into(), "+10000000001".into()),
            ("".into(), "+10000000002".into()),
            ("world".into(), "+10000000003".into()),
            ("a".into(), "+10000000004".into()),
            ("b".into(), "+10000000005".into()),
            ("beyond the cap".into(), "+10000000006".into()),
        ];
        let (records, stats) = pipeline.batch(&items).await;
        std::fs::remove_file(&path).ok();

        // Five items considered (cap), one skipped for empty message.
        assert_eq!(records.len(), 4);
        assert_eq!(stats.legitimate_count, 4);
        assert_eq!(stats.scam_count, 0);
        assert_eq!(stats.llm_used, 4);
        assert_eq!(stats.rules_used, 0);
        assert_eq!(stats.on_watchlist, 0);
    }
}
