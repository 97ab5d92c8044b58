//! Wires the real collaborators into an orchestrator from config.

use anyhow::{Context, Result};
use lumen_common::agenda::LocalAgendaStore;
use lumen_common::llm::OllamaClassifier;
use lumen_common::rate_limit::RateLimiter;
use lumen_common::search::{BraveSearchBackend, WebSearchProvider};
use lumen_common::settings::JsonFileBackend;
use lumen_common::sports::{EspnScoreboardProvider, SportsDbProvider};
use lumen_common::weather::{OpenMeteoWeather, WeatherProvider};
use lumen_common::{
    Collaborators, FallbackCoordinator, Formatter, LumenConfig, SearchOrchestrator, SettingsStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timeout for scoreboard lookups
const SPORTS_TIMEOUT: Duration = Duration::from_secs(6);

/// Weather service timeout
const WEATHER_TIMEOUT: Duration = Duration::from_secs(6);

pub struct App {
    pub config: LumenConfig,
    pub settings: Arc<SettingsStore>,
    pub orchestrator: SearchOrchestrator,
}

/// Settings store on the configured file
pub fn open_settings(config: &LumenConfig) -> Result<Arc<SettingsStore>> {
    let path = &config.paths.settings_file;
    let store = SettingsStore::open(
        Box::new(JsonFileBackend::new(path)),
        config.search.monthly_limit,
    )
    .with_context(|| format!("Failed to open settings at {}", path.display()))?;
    Ok(Arc::new(store))
}

pub async fn build(config: LumenConfig) -> Result<App> {
    let settings = open_settings(&config)?;

    let llm = OllamaClassifier::new(config.llm.clone()).context("Failed to create LLM client")?;

    let cache_ttl = config.cache.ttl();
    let cache_capacity = config.cache.capacity;

    let weather = Arc::new(FallbackCoordinator::with_cache(
        "weather",
        cache_ttl,
        cache_capacity,
    ));
    let open_meteo = OpenMeteoWeather::new(WEATHER_TIMEOUT, config.weather.forecast_days)
        .context("Failed to create weather client")?;
    weather
        .register(Arc::new(WeatherProvider::new(
            Arc::new(open_meteo),
            config.weather.use_celsius,
        )))
        .await;

    let sports = Arc::new(FallbackCoordinator::with_cache(
        "sports",
        cache_ttl,
        cache_capacity,
    ));
    sports
        .register(Arc::new(
            EspnScoreboardProvider::new(SPORTS_TIMEOUT).context("Failed to create ESPN client")?,
        ))
        .await;
    sports
        .register(Arc::new(
            SportsDbProvider::new(SPORTS_TIMEOUT).context("Failed to create TheSportsDB client")?,
        ))
        .await;

    let search = Arc::new(FallbackCoordinator::with_cache(
        "search",
        cache_ttl,
        cache_capacity,
    ));
    let brave = BraveSearchBackend::new(
        config.search.endpoint.clone(),
        Duration::from_secs(config.search.timeout_secs),
    )
    .context("Failed to create search client")?;
    search
        .register(Arc::new(
            WebSearchProvider::new(
                Arc::new(brave),
                settings.clone(),
                Arc::new(RateLimiter::new(config.search.min_interval())),
            )
            .with_count(config.search.result_count)
            .with_freshness(config.search.freshness.clone()),
        ))
        .await;

    let deps = Collaborators {
        settings: settings.clone(),
        llm: Arc::new(llm),
        agenda: Arc::new(LocalAgendaStore::new(config.paths.agenda_file.clone())),
        weather,
        sports,
        search,
    };

    let orchestrator = SearchOrchestrator::new(deps, Formatter::new(config.formatter))
        .with_default_location(config.weather.default_location.clone());
    debug!("orchestrator ready");

    Ok(App {
        config,
        settings,
        orchestrator,
    })
}
