//! Search orchestrator - the confirmation-gated state machine.
//!
//! `check_if_search_needed` classifies and gates without touching any data
//! source. Only `perform_confirmed_search` fetches, and only when a request
//! is pending. Each call holds the turn lock from start to finish so calls on
//! one orchestrator are processed strictly one after another.
//!
//! ```text
//! idle -> detecting_intent -> awaiting_confirmation -> fetching -> complete | failed
//!                          \-> idle                 \-> skipped
//! ```

use crate::agenda::AgendaService;
use crate::error::{AugmentError, Result};
use crate::formatter::{ContextPayload, Formatter};
use crate::intent::{detect_general_intent, extract_search_query, resolve_due_date, Query};
use crate::llm::LlmClassifier;
use crate::provider::FallbackCoordinator;
use crate::sanitizer::{sanitize, PiiKind};
use crate::search::SearchResult;
use crate::settings::SettingsStore;
use crate::sports::Scoreboard;
use crate::types::{
    ConfirmationRequest, DetailLevel, League, QueryDomain, SearchIntent, SearchOutcome,
    SearchState, SearchSubtype, TimeRange,
};
use crate::weather::WeatherSnapshot;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub settings: Arc<SettingsStore>,
    pub llm: Arc<dyn LlmClassifier>,
    pub agenda: Arc<dyn AgendaService>,
    pub weather: Arc<FallbackCoordinator<WeatherSnapshot>>,
    pub sports: Arc<FallbackCoordinator<Scoreboard>>,
    pub search: Arc<FallbackCoordinator<Vec<SearchResult>>>,
}

/// What a confirmed request will fetch
#[derive(Debug, Clone, PartialEq)]
enum FetchPlan {
    Weather { location: String },
    Calendar { range: TimeRange },
    ReminderList,
    ReminderCreate {
        title: String,
        due: Option<DateTime<Local>>,
    },
    Sports { league: League },
    WebSearch { query: String },
}

impl FetchPlan {
    fn subtype(&self) -> SearchSubtype {
        match self {
            Self::Weather { .. } => SearchSubtype::Weather,
            Self::Calendar { .. } => SearchSubtype::Calendar,
            Self::ReminderList => SearchSubtype::ReminderList,
            Self::ReminderCreate { .. } => SearchSubtype::ReminderCreate,
            Self::Sports { .. } => SearchSubtype::Sports,
            Self::WebSearch { .. } => SearchSubtype::WebSearch,
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Weather { location } => location.clone(),
            Self::Calendar { range } => range.label().to_string(),
            Self::ReminderList => "reminders".to_string(),
            Self::ReminderCreate { title, .. } => title.clone(),
            Self::Sports { league } => league.display_name().to_string(),
            Self::WebSearch { query } => query.clone(),
        }
    }
}

/// The one request allowed to wait for consent
struct Pending {
    raw_query: String,
    plan: FetchPlan,
    detail: DetailLevel,
}

/// A finished fetch with attribution
struct Fetch {
    payload: ContextPayload,
    provider: String,
    from_cache: bool,
}

impl Fetch {
    fn local(payload: ContextPayload, provider: &str) -> Self {
        Self {
            payload,
            provider: provider.to_string(),
            from_cache: false,
        }
    }
}

pub struct SearchOrchestrator {
    deps: Collaborators,
    formatter: Formatter,
    default_location: Option<String>,
    turn: Mutex<Option<Pending>>,
    state: watch::Sender<SearchState>,
}

impl SearchOrchestrator {
    pub fn new(deps: Collaborators, formatter: Formatter) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            deps,
            formatter,
            default_location: None,
            turn: Mutex::new(None),
            state,
        }
    }

    /// Place used for weather queries that name none
    pub fn with_default_location(mut self, location: Option<String>) -> Self {
        self.default_location = location
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());
        self
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.deps.settings
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Live view of state transitions for a UI
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn pending_request(&self) -> Option<ConfirmationRequest> {
        self.state.borrow().pending_confirmation().cloned()
    }

    fn set_state(&self, next: SearchState) {
        debug!("search state -> {}", next.name());
        self.state.send_replace(next);
    }

    // ------------------------------------------------------------------------
    // Gate
    // ------------------------------------------------------------------------

    /// Classify `raw` and decide whether to ask for consent. Never fetches.
    pub async fn check_if_search_needed(&self, raw: &str) -> bool {
        let mut turn = self.turn.lock().await;
        if turn.take().is_some() {
            debug!("discarding unanswered confirmation");
        }

        self.set_state(SearchState::DetectingIntent);
        let query = Query::classify(raw);
        info!("query domain: {} ({} chars)", query.domain, raw.chars().count());

        let planned = match query.domain {
            QueryDomain::Calendar => Some((
                FetchPlan::Calendar {
                    range: query.time_range,
                },
                DetailLevel::Brief,
            )),
            QueryDomain::Reminders => Some((Self::reminder_plan(&query), DetailLevel::Brief)),
            QueryDomain::Weather => self.weather_plan(&query).map(|p| (p, DetailLevel::Brief)),
            QueryDomain::Sports => match query.league {
                Some(league) => Some((FetchPlan::Sports { league }, DetailLevel::Brief)),
                None => self.general_plan(raw).await,
            },
            QueryDomain::General => self.general_plan(raw).await,
        };

        match planned {
            Some((plan, detail)) => {
                let request = ConfirmationRequest::new(plan.display(), plan.subtype());
                info!("awaiting confirmation for {}", request.subtype.as_str());
                *turn = Some(Pending {
                    raw_query: raw.to_string(),
                    plan,
                    detail,
                });
                self.set_state(SearchState::AwaitingConfirmation(request));
                true
            }
            None => {
                self.set_state(SearchState::Idle);
                false
            }
        }
    }

    fn reminder_plan(query: &Query) -> FetchPlan {
        let request = query.reminder.clone().unwrap_or_default();
        match (request.is_creation, request.title) {
            (true, Some(title)) => {
                let due = request
                    .time_hint
                    .as_deref()
                    .and_then(|hint| resolve_due_date(hint, Local::now()));
                FetchPlan::ReminderCreate { title, due }
            }
            _ => FetchPlan::ReminderList,
        }
    }

    fn weather_plan(&self, query: &Query) -> Option<FetchPlan> {
        let location = query
            .location
            .clone()
            .or_else(|| self.default_location.clone());
        if location.is_none() {
            debug!("weather query without a location and no default configured");
        }
        location.map(|location| FetchPlan::Weather { location })
    }

    /// Web search plan, or `None` to answer offline. A refusal is only logged.
    async fn general_plan(&self, raw: &str) -> Option<(FetchPlan, DetailLevel)> {
        match self.web_search_plan(raw).await {
            Ok(plan) => plan,
            Err(e) => {
                info!("web search refused: {}", e.kind());
                None
            }
        }
    }

    /// Web search gating: settings, quota, intent, LLM, sanitizer, detail.
    async fn web_search_plan(&self, raw: &str) -> Result<Option<(FetchPlan, DetailLevel)>> {
        let settings = &self.deps.settings;
        if !settings.is_enabled() {
            debug!("web search disabled");
            return Ok(None);
        }
        if !settings.has_api_key() {
            debug!("no search API key");
            return Ok(None);
        }
        if !settings.has_quota() {
            info!("monthly search quota exhausted");
            return Ok(None);
        }

        match detect_general_intent(raw) {
            SearchIntent::NoSearchNeeded => return Ok(None),
            SearchIntent::DefinitelyNeedsSearch => {}
            SearchIntent::ProbablyNeedsSearch => match self.deps.llm.needs_web_search(raw).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("classifier: no search needed");
                    return Ok(None);
                }
                Err(e) => {
                    warn!("search-need classification failed: {}", e);
                    return Ok(None);
                }
            },
        }

        self.set_state(SearchState::Sanitizing);
        let sanitized = sanitize(raw);
        if sanitized.contained_pii {
            let kinds: Vec<&str> = sanitized.pii_kinds.iter().map(|k| k.as_str()).collect();
            info!("redacted before search: {}", kinds.join(", "));
        }
        if !sanitized.should_proceed {
            if sanitized.pii_kinds.contains(&PiiKind::SensitiveTopic) {
                return Err(AugmentError::SensitiveContent);
            }
            info!("sanitized query too short to send");
            return Ok(None);
        }
        let query = extract_search_query(&sanitized.sanitized_text);
        if query.chars().count() < crate::sanitizer::MIN_QUERY_LEN {
            return Ok(None);
        }

        let detail = match self.deps.llm.classify_response_detail(raw).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!("detail classification failed, using brief: {}", e);
                DetailLevel::Brief
            }
        };

        Ok(Some((FetchPlan::WebSearch { query }, detail)))
    }

    // ------------------------------------------------------------------------
    // Decision
    // ------------------------------------------------------------------------

    /// Run the pending request for `query`.
    pub async fn perform_confirmed_search(&self, query: &str) -> SearchOutcome {
        self.perform_confirmed_search_with_cancel(query, CancellationToken::new())
            .await
    }

    /// Run the pending request, abandoning it if `cancel` fires first.
    ///
    /// Without a pending request for `query` this does nothing and returns a
    /// failed outcome. A cancelled fetch leaves usage and cache untouched.
    pub async fn perform_confirmed_search_with_cancel(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> SearchOutcome {
        let mut turn = self.turn.lock().await;
        let pending = match turn.take() {
            Some(p) if p.raw_query == query => p,
            other => {
                *turn = other;
                warn!("confirmed search without a matching pending request");
                return SearchOutcome::failed("No search is awaiting confirmation", DetailLevel::Brief);
            }
        };

        let subtype = pending.plan.subtype();
        self.set_state(SearchState::Fetching(subtype));
        let detail = pending.detail;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AugmentError::Cancelled),
            fetched = self.fetch(&pending.plan) => fetched,
        };

        match result {
            Ok(fetch) => {
                if subtype == SearchSubtype::WebSearch && !fetch.from_cache {
                    if let Err(e) = self.deps.settings.record_search() {
                        warn!("failed to record search usage: {}", e);
                    }
                }
                let context = self.formatter.format(
                    &fetch.payload,
                    &pending.plan.display(),
                    detail,
                    &fetch.provider,
                    Local::now(),
                );
                info!(
                    "{} complete via {}{}",
                    subtype.as_str(),
                    fetch.provider,
                    if fetch.from_cache { " (cached)" } else { "" }
                );
                self.set_state(SearchState::Complete {
                    subtype,
                    source_count: context.source_labels.len(),
                });
                SearchOutcome::from_context(context, detail)
            }
            Err(e) => {
                if e.is_soft() {
                    info!("{} skipped: {}", subtype.as_str(), e.kind());
                } else {
                    warn!("{} failed: {}", subtype.as_str(), e);
                }
                self.set_state(SearchState::Failed { reason: e.reason() });
                SearchOutcome::from_error(&e, detail)
            }
        }
    }

    async fn fetch(&self, plan: &FetchPlan) -> Result<Fetch> {
        match plan {
            FetchPlan::Weather { location } => {
                let fetched = self.deps.weather.fetch(location).await?;
                Ok(Fetch {
                    payload: ContextPayload::Weather(fetched.value),
                    provider: fetched.provider,
                    from_cache: fetched.from_cache,
                })
            }
            FetchPlan::Sports { league } => {
                let fetched = self.deps.sports.fetch(league.key()).await?;
                Ok(Fetch {
                    payload: ContextPayload::Sports(fetched.value),
                    provider: fetched.provider,
                    from_cache: fetched.from_cache,
                })
            }
            FetchPlan::WebSearch { query } => {
                if !self.deps.settings.has_quota() {
                    return Err(AugmentError::QuotaExceeded);
                }
                let fetched = self.deps.search.fetch(query).await?;
                Ok(Fetch {
                    payload: ContextPayload::Search(fetched.value),
                    provider: fetched.provider,
                    from_cache: fetched.from_cache,
                })
            }
            FetchPlan::Calendar { range } => {
                self.require_agenda_access().await?;
                let events = self.deps.agenda.fetch_events(*range).await?;
                Ok(Fetch::local(
                    ContextPayload::Calendar {
                        range: *range,
                        events,
                    },
                    "calendar",
                ))
            }
            FetchPlan::ReminderList => {
                self.require_agenda_access().await?;
                let reminders = self.deps.agenda.fetch_reminders().await?;
                Ok(Fetch::local(ContextPayload::Reminders(reminders), "reminders"))
            }
            FetchPlan::ReminderCreate { title, due } => {
                self.require_agenda_access().await?;
                let reminder = self.deps.agenda.create_reminder(title, *due).await?;
                Ok(Fetch::local(
                    ContextPayload::ReminderCreated(reminder),
                    "reminders",
                ))
            }
        }
    }

    async fn require_agenda_access(&self) -> Result<()> {
        if self.deps.agenda.request_access().await? {
            Ok(())
        } else {
            Err(AugmentError::PermissionDenied)
        }
    }

    /// User said no. Resolves offline and never touches quota.
    pub async fn decline_search(&self) {
        let mut turn = self.turn.lock().await;
        if turn.take().is_some() {
            info!("search declined");
            self.set_state(SearchState::Skipped);
        } else {
            debug!("decline with nothing pending");
        }
    }

    /// Back to idle for the next turn
    pub async fn reset(&self) {
        let mut turn = self.turn.lock().await;
        *turn = None;
        self.set_state(SearchState::Idle);
    }
}
