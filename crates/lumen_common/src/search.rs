//! Web search backend and its provider adapter.
//!
//! The backend speaks the Brave Search API. The adapter plugs it into the
//! fallback coordinator: it reads the API key from the settings store and
//! spaces requests through the shared rate limiter.

use crate::error::{AugmentError, Result};
use crate::provider::Provider;
use crate::rate_limit::RateLimiter;
use crate::settings::SettingsStore;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Result kinds, in the order the detailed formatter prefers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCategory {
    InstantAnswer,
    Faq,
    News,
    Location,
    Discussion,
    General,
}

impl ResultCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InstantAnswer => "Answer",
            Self::Faq => "FAQ",
            Self::News => "News",
            Self::Location => "Place",
            Self::Discussion => "Discussion",
            Self::General => "Web",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
    pub category: ResultCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

impl SearchResult {
    pub fn new(
        category: ResultCategory,
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            category,
            age: None,
        }
    }

    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    /// Host part of the URL, used as a source label
    pub fn source_label(&self) -> String {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        let host = without_scheme.split('/').next().unwrap_or(without_scheme);
        host.trim_start_matches("www.").to_string()
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(
        &self,
        query: &str,
        api_key: &str,
        count: u32,
        freshness: Option<&str>,
    ) -> Result<Vec<SearchResult>>;
}

// ============================================================================
// Brave
// ============================================================================

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Drop inline markup and the common entities from snippet text
pub fn strip_markup(text: &str) -> String {
    TAGS.replace_all(text, "")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

#[derive(Debug, Default, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveSection<BraveItem>>,
    #[serde(default)]
    news: Option<BraveSection<BraveItem>>,
    #[serde(default)]
    faq: Option<BraveSection<BraveFaq>>,
    #[serde(default)]
    locations: Option<BraveSection<BraveItem>>,
    #[serde(default)]
    discussions: Option<BraveSection<BraveItem>>,
    #[serde(default)]
    infobox: Option<BraveSection<BraveItem>>,
}

#[derive(Debug, Deserialize)]
struct BraveSection<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BraveItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    age: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BraveFaq {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    url: String,
}

fn collect(items: Option<BraveSection<BraveItem>>, category: ResultCategory, out: &mut Vec<SearchResult>) {
    for item in items.map(|s| s.results).unwrap_or_default() {
        let result = SearchResult::new(
            category,
            strip_markup(&item.title),
            item.url,
            strip_markup(&item.description),
        );
        out.push(match item.age {
            Some(age) => result.with_age(age),
            None => result,
        });
    }
}

/// Flatten a Brave response body into categorised results
pub fn parse_brave_response(body: &str) -> Result<Vec<SearchResult>> {
    let response: BraveResponse =
        serde_json::from_str(body).map_err(|e| AugmentError::Parse(e.to_string()))?;

    let mut results = Vec::new();
    collect(response.infobox, ResultCategory::InstantAnswer, &mut results);
    for faq in response.faq.map(|s| s.results).unwrap_or_default() {
        results.push(SearchResult::new(
            ResultCategory::Faq,
            strip_markup(&faq.question),
            faq.url,
            strip_markup(&faq.answer),
        ));
    }
    collect(response.news, ResultCategory::News, &mut results);
    collect(response.locations, ResultCategory::Location, &mut results);
    collect(response.discussions, ResultCategory::Discussion, &mut results);
    collect(response.web, ResultCategory::General, &mut results);
    Ok(results)
}

pub struct BraveSearchBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl BraveSearchBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl SearchBackend for BraveSearchBackend {
    async fn search(
        &self,
        query: &str,
        api_key: &str,
        count: u32,
        freshness: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("count", count.to_string()),
        ];
        if let Some(f) = freshness.filter(|f| !f.is_empty()) {
            params.push(("freshness", f.to_string()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            401 | 403 => return Err(AugmentError::InvalidApiKey),
            429 => return Err(AugmentError::RateLimited),
            _ if !status.is_success() => {
                return Err(AugmentError::Provider(format!("HTTP {}", status)));
            }
            _ => {}
        }

        let body = response.text().await?;
        let results = parse_brave_response(&body)?;
        debug!("brave: {} results", results.len());
        Ok(results)
    }
}

// ============================================================================
// Provider adapter
// ============================================================================

pub struct WebSearchProvider {
    backend: Arc<dyn SearchBackend>,
    settings: Arc<SettingsStore>,
    limiter: Arc<RateLimiter>,
    count: u32,
    freshness: Option<String>,
}

impl WebSearchProvider {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        settings: Arc<SettingsStore>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            backend,
            settings,
            limiter,
            count: 10,
            freshness: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_freshness(mut self, freshness: Option<String>) -> Self {
        self.freshness = freshness;
        self
    }
}

#[async_trait]
impl Provider for WebSearchProvider {
    type Output = Vec<SearchResult>;

    fn name(&self) -> &str {
        "brave"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn supports(&self, key: &str) -> bool {
        !key.trim().is_empty()
    }

    async fn is_available(&self) -> bool {
        self.settings.has_api_key()
    }

    async fn fetch(&self, key: &str) -> Result<Vec<SearchResult>> {
        let api_key = self.settings.api_key().ok_or(AugmentError::ApiKeyMissing)?;
        self.limiter.acquire().await;
        let results = self
            .backend
            .search(key, &api_key, self.count, self.freshness.as_deref())
            .await?;
        if results.is_empty() {
            warn!("web search returned nothing");
            return Err(AugmentError::NoResults);
        }
        Ok(results)
    }
}
