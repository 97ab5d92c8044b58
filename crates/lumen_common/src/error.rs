//! Error types for the augmentation layer.
//!
//! Every variant carries a short reason for UI display. None of these is fatal
//! to the conversation: the caller can always answer without external context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AugmentError {
    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Monthly search quota exceeded")]
    QuotaExceeded,

    #[error("Query contains sensitive content")]
    SensitiveContent,

    #[error("No results found")]
    NoResults,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key missing")]
    ApiKeyMissing,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Location not found")]
    LocationNotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Request cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AugmentError {
    /// Stable label stored in `ExternalContext::error_kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            AugmentError::NetworkUnavailable => "network_unavailable",
            AugmentError::RateLimited => "rate_limited",
            AugmentError::QuotaExceeded => "quota_exceeded",
            AugmentError::SensitiveContent => "sensitive_content",
            AugmentError::NoResults => "no_results",
            AugmentError::InvalidApiKey => "invalid_api_key",
            AugmentError::ApiKeyMissing => "api_key_missing",
            AugmentError::Provider(_) => "provider_error",
            AugmentError::Parse(_) => "parse_error",
            AugmentError::LocationNotFound => "location_not_found",
            AugmentError::PermissionDenied => "permission_denied",
            AugmentError::Cancelled => "cancelled",
            AugmentError::Io(_) => "io_error",
            AugmentError::Json(_) => "json_error",
        }
    }

    /// Short human-readable reason for the UI.
    pub fn reason(&self) -> String {
        match self {
            AugmentError::NetworkUnavailable => "No network connection".to_string(),
            AugmentError::RateLimited => "Too many requests, try again shortly".to_string(),
            AugmentError::QuotaExceeded => "Monthly search limit reached".to_string(),
            AugmentError::SensitiveContent => "Query looks sensitive, kept on device".to_string(),
            AugmentError::NoResults => "No data available".to_string(),
            AugmentError::InvalidApiKey => "Search API key was rejected".to_string(),
            AugmentError::ApiKeyMissing => "No search API key configured".to_string(),
            AugmentError::Provider(detail) => format!("Provider failed: {}", detail),
            AugmentError::Parse(detail) => format!("Could not read response: {}", detail),
            AugmentError::LocationNotFound => "Location not found".to_string(),
            AugmentError::PermissionDenied => "Access was not granted".to_string(),
            AugmentError::Cancelled => "cancelled".to_string(),
            AugmentError::Io(e) => format!("Storage error: {}", e),
            AugmentError::Json(e) => format!("Storage format error: {}", e),
        }
    }

    /// Soft failures skip augmentation without retrying.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            AugmentError::RateLimited | AugmentError::QuotaExceeded | AugmentError::Cancelled
        )
    }
}

impl From<reqwest::Error> for AugmentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            AugmentError::NetworkUnavailable
        } else if e.is_decode() {
            AugmentError::Parse(e.to_string())
        } else {
            AugmentError::Provider(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AugmentError>;
