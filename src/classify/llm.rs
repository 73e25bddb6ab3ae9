//! Ollama inference client + the provider abstraction the pipeline talks to.
//!
//! One attempt per classification, hard timeout, no retries: a slow or dead
//! model degrades to the rule-based path instead of stalling the request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::verdict::FallbackError;

/// Transport-level failure of the inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// Connection refused / endpoint not reachable.
    Offline,
    /// The request exceeded the timeout budget.
    Timeout,
    /// Anything else (bad status, decode failure, ...).
    Other(String),
}

impl InferenceError {
    /// Wire tag attached to fallback results.
    pub fn as_fallback(&self) -> FallbackError {
        match self {
            InferenceError::Offline => FallbackError::OllamaOffline,
            InferenceError::Timeout => FallbackError::Timeout,
            InferenceError::Other(_) => FallbackError::Error,
        }
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::Offline => write!(f, "inference endpoint offline"),
            InferenceError::Timeout => write!(f, "inference request timed out"),
            InferenceError::Other(msg) => write!(f, "inference error: {msg}"),
        }
    }
}

/// Provider seam: the pipeline and tests depend on this, not on reqwest.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Single completion request; returns the raw text reply.
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
    /// Names of the models installed on the endpoint.
    async fn list_models(&self) -> Result<Vec<String>, InferenceError>;
    /// Model the client is configured to use.
    fn model_name(&self) -> &str;
}

/// Fixed prompt template. Bias is deliberately conservative: the model is told
/// to prefer LEGITIMATE unless indicators are clear, and to answer in the
/// exact three-line contract `parser.rs` expects.
pub fn build_prompt(message: &str, sender: &str) -> String {
    format!(
        "You are an expert SMS security analyst. Analyze this text message for scam indicators.\n\
         \n\
         Sender: {sender}\n\
         Message: \"{message}\"\n\
         \n\
         Scam indicators to look for:\n\
         - Urgent language or threats (\"act now\", \"account suspended\", \"legal action\")\n\
         - Requests for personal or financial information (SSN, OTP, card number, password)\n\
         - Suspicious or shortened links\n\
         - Prize, lottery, or refund claims\n\
         - Impersonation of banks, government agencies, or delivery services\n\
         \n\
         Legitimate message categories:\n\
         - Bank transaction alerts and statements\n\
         - Delivery and order notifications\n\
         - Appointment and booking confirmations\n\
         - One-time passwords the user requested\n\
         - Personal conversation\n\
         \n\
         Be conservative: when in doubt, prefer LEGITIMATE. Most messages are not scams.\n\
         \n\
         Respond in EXACTLY this format and nothing else:\n\
         CLASSIFICATION: <SCAM or LEGITIMATE>\n\
         CONFIDENCE: <number between 50 and 100>\n\
         REASON: <one short sentence>\n"
    )
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    repeat_penalty: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

/// Client for a locally hosted Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("sms-scam-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn map_err(err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout
        } else if err.is_connect() {
            InferenceError::Offline
        } else {
            InferenceError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                // Low temperature for repeatable verdicts.
                temperature: 0.1,
                top_p: 0.9,
                num_predict: 150,
                repeat_penalty: 1.1,
            },
        };

        let resp = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&req)
            .send()
            .await
            .map_err(Self::map_err)?;

        if !resp.status().is_success() {
            return Err(InferenceError::Other(format!(
                "unexpected status {}",
                resp.status()
            )));
        }

        let body: GenerateResponse = resp.json().await.map_err(Self::map_err)?;
        Ok(body.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let resp = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(Self::map_err)?;

        if !resp.status().is_success() {
            return Err(InferenceError::Other(format!(
                "unexpected status {}",
                resp.status()
            )));
        }

        let body: TagsResponse = resp.json().await.map_err(Self::map_err)?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Deterministic client returning a fixed reply; used in tests and local runs
/// without an Ollama install.
#[derive(Clone)]
pub struct StaticClient {
    pub reply: String,
    pub model: String,
}

impl StaticClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            model: "static-test-model".to_string(),
        }
    }
}

#[async_trait]
impl InferenceClient for StaticClient {
    async fn generate(&self, _prompt: &str) -> Result<String, InferenceError> {
        Ok(self.reply.clone())
    }

    async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        Ok(vec![self.model.clone()])
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Client that always fails with a fixed error; exercises the fallback path.
#[derive(Clone)]
pub struct FailingClient {
    pub error: InferenceError,
}

impl FailingClient {
    pub fn offline() -> Self {
        Self {
            error: InferenceError::Offline,
        }
    }

    pub fn timing_out() -> Self {
        Self {
            error: InferenceError::Timeout,
        }
    }
}

#[async_trait]
impl InferenceClient for FailingClient {
    async fn generate(&self, _prompt: &str) -> Result<String, InferenceError> {
        Err(self.error.clone())
    }

    async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        Err(self.error.clone())
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }
}
