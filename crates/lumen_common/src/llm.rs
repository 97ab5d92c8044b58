//! LLM classifier collaborator.
//!
//! Two single-shot, bounded classification calls against the local model:
//! does this question need the web, and does the user expect a brief or a
//! detailed answer. Real implementation talks to Ollama; the fake counts calls.

use crate::config::LlmConfig;
use crate::types::DetailLevel;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("Unrecognised verdict: {0}")]
    Unrecognised(String),
}

#[async_trait]
pub trait LlmClassifier: Send + Sync {
    /// Whether answering `query` well needs live web results
    async fn needs_web_search(&self, query: &str) -> Result<bool, LlmError>;

    /// Expected answer length for `query`
    async fn classify_response_detail(&self, query: &str) -> Result<DetailLevel, LlmError>;
}

const SEARCH_PROMPT: &str = "You decide whether a question needs a live web search. \
Answer YES if it depends on recent events, prices, schedules or anything that changes \
over time. Answer NO if general knowledge is enough. Reply with one word: YES or NO.";

const DETAIL_PROMPT: &str = "You decide how long an answer should be. Reply BRIEF if \
a sentence or two will do (facts, definitions, quick lookups). Reply DETAILED if the \
user wants an explanation, comparison, overview or list. Reply with one word: BRIEF or DETAILED.";

/// First word of a verdict, upper-cased and stripped of punctuation
fn verdict_word(text: &str) -> Option<String> {
    text.split_whitespace()
        .next()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_ascii_alphabetic())
                .to_ascii_uppercase()
        })
        .filter(|w| !w.is_empty())
}

pub fn parse_yes_no(text: &str) -> Result<bool, LlmError> {
    match verdict_word(text).as_deref() {
        Some("YES") => Ok(true),
        Some("NO") => Ok(false),
        Some(_) => Err(LlmError::Unrecognised(text.trim().to_string())),
        None => Err(LlmError::EmptyResponse),
    }
}

pub fn parse_detail(text: &str) -> Result<DetailLevel, LlmError> {
    match verdict_word(text).as_deref() {
        Some("BRIEF") => Ok(DetailLevel::Brief),
        Some("DETAILED") => Ok(DetailLevel::Detailed),
        Some(_) => Err(LlmError::Unrecognised(text.trim().to_string())),
        None => Err(LlmError::EmptyResponse),
    }
}

// ============================================================================
// Ollama
// ============================================================================

pub struct OllamaClassifier {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OllamaClassifier {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    async fn generate(&self, system: &str, query: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model,
            "system": system,
            "prompt": query,
            "stream": false,
            "options": {
                "temperature": 0.0,
                "num_predict": self.config.max_tokens,
            },
        });

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.config.timeout_secs)
            } else {
                LlmError::HttpError(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from Ollama",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::HttpError(format!("Failed to parse response: {}", e)))?;

        let text = json
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or(LlmError::EmptyResponse)?;
        debug!("classifier verdict: {:?}", text.trim());
        Ok(text.to_string())
    }
}

#[async_trait]
impl LlmClassifier for OllamaClassifier {
    async fn needs_web_search(&self, query: &str) -> Result<bool, LlmError> {
        let text = self.generate(SEARCH_PROMPT, query).await?;
        parse_yes_no(&text)
    }

    async fn classify_response_detail(&self, query: &str) -> Result<DetailLevel, LlmError> {
        let text = self.generate(DETAIL_PROMPT, query).await?;
        parse_detail(&text)
    }
}

// ============================================================================
// Fake (Testing)
// ============================================================================

/// Scripted classifier. Each method counts its own calls.
pub struct FakeLlmClassifier {
    needs_search: Mutex<Result<bool, LlmError>>,
    detail: Mutex<Result<DetailLevel, LlmError>>,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl FakeLlmClassifier {
    pub fn new(needs_search: bool, detail: DetailLevel) -> Self {
        Self {
            needs_search: Mutex::new(Ok(needs_search)),
            detail: Mutex::new(Ok(detail)),
            search_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            needs_search: Mutex::new(Err(error.clone())),
            detail: Mutex::new(Err(error)),
            search_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_needs_search(&self, verdict: Result<bool, LlmError>) {
        if let Ok(mut guard) = self.needs_search.lock() {
            *guard = verdict;
        }
    }

    pub fn set_detail(&self, verdict: Result<DetailLevel, LlmError>) {
        if let Ok(mut guard) = self.detail.lock() {
            *guard = verdict;
        }
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClassifier for FakeLlmClassifier {
    async fn needs_web_search(&self, _query: &str) -> Result<bool, LlmError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.needs_search
            .lock()
            .map_err(|_| LlmError::EmptyResponse)?
            .clone()
    }

    async fn classify_response_detail(&self, _query: &str) -> Result<DetailLevel, LlmError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail.lock().map_err(|_| LlmError::EmptyResponse)?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("YES"), Ok(true));
        assert_eq!(parse_yes_no("  yes.\n"), Ok(true));
        assert_eq!(parse_yes_no("No, general knowledge"), Ok(false));
        assert_eq!(parse_yes_no(""), Err(LlmError::EmptyResponse));
        assert!(matches!(parse_yes_no("maybe"), Err(LlmError::Unrecognised(_))));
    }

    #[test]
    fn test_parse_detail() {
        assert_eq!(parse_detail("BRIEF"), Ok(DetailLevel::Brief));
        assert_eq!(parse_detail("Detailed."), Ok(DetailLevel::Detailed));
        assert!(parse_detail("long").is_err());
    }

    #[tokio::test]
    async fn test_fake_counts_calls_separately() {
        let fake = FakeLlmClassifier::new(true, DetailLevel::Detailed);
        assert_eq!(fake.needs_web_search("q").await, Ok(true));
        assert_eq!(fake.needs_web_search("q").await, Ok(true));
        assert_eq!(
            fake.classify_response_detail("q").await,
            Ok(DetailLevel::Detailed)
        );
        assert_eq!(fake.search_calls(), 2);
        assert_eq!(fake.detail_calls(), 1);

        fake.set_needs_search(Ok(false));
        assert_eq!(fake.needs_web_search("q").await, Ok(false));
    }

    #[tokio::test]
    async fn test_fake_failing() {
        let fake = FakeLlmClassifier::failing(LlmError::Timeout(4));
        assert_eq!(fake.needs_web_search("q").await, Err(LlmError::Timeout(4)));
        assert!(fake.classify_response_detail("q").await.is_err());
    }
}
