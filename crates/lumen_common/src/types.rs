//! Core types shared by the classifier, orchestrator and formatter.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Domain a query belongs to. Exactly one per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryDomain {
    Weather,
    Calendar,
    Reminders,
    Sports,
    General,
}

impl QueryDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Calendar => "calendar",
            Self::Reminders => "reminders",
            Self::Sports => "sports",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for QueryDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Search-need confidence for general queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    DefinitelyNeedsSearch,
    ProbablyNeedsSearch,
    NoSearchNeeded,
}

/// How much the user expects back. Drives formatter budget and generation length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    #[default]
    Brief,
    Detailed,
}

impl DetailLevel {
    /// Token budget handed to the downstream generation call.
    pub fn generation_tokens(&self) -> u32 {
        match self {
            Self::Brief => 256,
            Self::Detailed => 768,
        }
    }
}

/// Calendar lookup window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    Today,
    Tomorrow,
    ThisWeek,
}

impl TimeRange {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this week",
        }
    }
}

/// Sports leagues with scoreboard coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum League {
    Nba,
    Wnba,
    Nfl,
    Mlb,
    Nhl,
    Mls,
    PremierLeague,
}

impl League {
    /// Cache/provider key for this league
    pub fn key(&self) -> &'static str {
        match self {
            Self::Nba => "nba",
            Self::Wnba => "wnba",
            Self::Nfl => "nfl",
            Self::Mlb => "mlb",
            Self::Nhl => "nhl",
            Self::Mls => "mls",
            Self::PremierLeague => "epl",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "nba" => Some(Self::Nba),
            "wnba" => Some(Self::Wnba),
            "nfl" => Some(Self::Nfl),
            "mlb" => Some(Self::Mlb),
            "nhl" => Some(Self::Nhl),
            "mls" => Some(Self::Mls),
            "epl" => Some(Self::PremierLeague),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nba => "NBA",
            Self::Wnba => "WNBA",
            Self::Nfl => "NFL",
            Self::Mlb => "MLB",
            Self::Nhl => "NHL",
            Self::Mls => "MLS",
            Self::PremierLeague => "Premier League",
        }
    }
}

/// Parsed reminder phrasing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    /// "remind me to ..." style creation, as opposed to listing
    pub is_creation: bool,
    pub title: Option<String>,
    pub time_hint: Option<String>,
}

/// Which fetch a pending confirmation will run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSubtype {
    Weather,
    Calendar,
    ReminderList,
    ReminderCreate,
    Sports,
    WebSearch,
}

impl SearchSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Calendar => "calendar",
            Self::ReminderList => "reminder_list",
            Self::ReminderCreate => "reminder_create",
            Self::Sports => "sports",
            Self::WebSearch => "web_search",
        }
    }

    pub fn domain(&self) -> QueryDomain {
        match self {
            Self::Weather => QueryDomain::Weather,
            Self::Calendar => QueryDomain::Calendar,
            Self::ReminderList | Self::ReminderCreate => QueryDomain::Reminders,
            Self::Sports => QueryDomain::Sports,
            Self::WebSearch => QueryDomain::General,
        }
    }

    /// Text shown on the consent prompt
    pub fn prompt_verb(&self) -> &'static str {
        match self {
            Self::Weather => "Check the weather for",
            Self::Calendar => "Read your calendar for",
            Self::ReminderList => "Read your reminders",
            Self::ReminderCreate => "Create a reminder",
            Self::Sports => "Look up scores for",
            Self::WebSearch => "Search the web for",
        }
    }
}

/// Pending consent request. Exists only between classification and decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub display_query: String,
    pub domain: QueryDomain,
    pub subtype: SearchSubtype,
    pub created_at: DateTime<Local>,
}

impl ConfirmationRequest {
    pub fn new(display_query: impl Into<String>, subtype: SearchSubtype) -> Self {
        Self {
            display_query: display_query.into(),
            domain: subtype.domain(),
            subtype,
            created_at: Local::now(),
        }
    }

    /// One-line prompt for the consent UI
    pub fn prompt(&self) -> String {
        match self.subtype {
            SearchSubtype::ReminderList => format!("{}?", self.subtype.prompt_verb()),
            _ => format!("{} \"{}\"?", self.subtype.prompt_verb(), self.display_query),
        }
    }
}

/// Observable state of one orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    DetectingIntent,
    AwaitingConfirmation(ConfirmationRequest),
    Sanitizing,
    Fetching(SearchSubtype),
    Complete {
        subtype: SearchSubtype,
        source_count: usize,
    },
    Failed {
        reason: String,
    },
    Skipped,
}

impl SearchState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DetectingIntent => "detecting_intent",
            Self::AwaitingConfirmation(_) => "awaiting_confirmation",
            Self::Sanitizing => "sanitizing",
            Self::Fetching(_) => "fetching",
            Self::Complete { .. } => "complete",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Turn has resolved and only `reset` moves on
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete { .. } | Self::Failed { .. } | Self::Skipped
        )
    }

    pub fn pending_confirmation(&self) -> Option<&ConfirmationRequest> {
        match self {
            Self::AwaitingConfirmation(request) => Some(request),
            _ => None,
        }
    }
}

/// Normalized provider result, ready for prompt injection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalContext {
    pub succeeded: bool,
    pub formatted_text: String,
    pub source_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ExternalContext {
    pub fn success(formatted_text: String, source_labels: Vec<String>) -> Self {
        Self {
            succeeded: true,
            formatted_text,
            source_labels,
            error_kind: None,
        }
    }

    pub fn failure(error: &crate::error::AugmentError) -> Self {
        Self {
            succeeded: false,
            formatted_text: String::new(),
            source_labels: Vec::new(),
            error_kind: Some(error.kind().to_string()),
        }
    }
}

/// What `perform_confirmed_search` hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub succeeded: bool,
    pub formatted_context: String,
    pub sources: Vec<String>,
    pub detail_level: DetailLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// `AugmentError::kind` of the failure, when one caused it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl SearchOutcome {
    pub fn from_context(context: ExternalContext, detail_level: DetailLevel) -> Self {
        Self {
            succeeded: context.succeeded,
            formatted_context: context.formatted_text,
            sources: context.source_labels,
            detail_level,
            failure_reason: None,
            error_kind: context.error_kind,
        }
    }

    /// A turn that failed with a domain error
    pub fn from_error(error: &crate::error::AugmentError, detail_level: DetailLevel) -> Self {
        Self {
            failure_reason: Some(error.reason()),
            ..Self::from_context(ExternalContext::failure(error), detail_level)
        }
    }

    /// A call that had nothing to act on
    pub fn failed(reason: impl Into<String>, detail_level: DetailLevel) -> Self {
        Self {
            succeeded: false,
            formatted_context: String::new(),
            sources: Vec::new(),
            detail_level,
            failure_reason: Some(reason.into()),
            error_kind: None,
        }
    }
}
