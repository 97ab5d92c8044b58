//! Weather collaborator: Open-Meteo geocoding plus forecast, wrapped as a
//! single-provider source for the fallback coordinator.

use crate::error::{AugmentError, Result};
use crate::provider::Provider;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Resolved place name, e.g. "Boston, United States"
    pub location: String,
    pub temperature: f64,
    pub condition: String,
    pub humidity: Option<u8>,
    pub wind_speed: Option<f64>,
    pub use_celsius: bool,
    pub daily: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    pub fn unit(&self) -> &'static str {
        if self.use_celsius {
            "°C"
        } else {
            "°F"
        }
    }

    pub fn wind_unit(&self) -> &'static str {
        if self.use_celsius {
            "km/h"
        } else {
            "mph"
        }
    }
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn fetch_weather(&self, location: &str, use_celsius: bool) -> Result<WeatherSnapshot>;
}

/// WMO weather interpretation code to a short phrase
pub fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 => "Rain",
        65 => "Heavy rain",
        66 | 67 => "Freezing rain",
        71 | 73 => "Snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown conditions",
    }
}

// ============================================================================
// Open-Meteo
// ============================================================================

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    weather_code: u32,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<NaiveDate>,
    weather_code: Vec<u32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

pub struct OpenMeteoWeather {
    client: reqwest::Client,
    forecast_days: u32,
}

impl OpenMeteoWeather {
    pub fn new(timeout: Duration, forecast_days: u32) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            forecast_days: forecast_days.clamp(1, 7),
        })
    }

    async fn geocode(&self, location: &str) -> Result<GeocodeHit> {
        let response: GeocodeResponse = self
            .client
            .get(GEOCODE_URL)
            .query(&[("name", location), ("count", "1"), ("language", "en")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or(AugmentError::LocationNotFound)
    }
}

#[async_trait]
impl WeatherService for OpenMeteoWeather {
    async fn fetch_weather(&self, location: &str, use_celsius: bool) -> Result<WeatherSnapshot> {
        let place = self.geocode(location).await?;
        debug!("geocoded {} to {:.2},{:.2}", place.name, place.latitude, place.longitude);

        let temperature_unit = if use_celsius { "celsius" } else { "fahrenheit" };
        let wind_unit = if use_celsius { "kmh" } else { "mph" };
        let forecast: ForecastResponse = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m".to_string(),
                ),
                (
                    "daily",
                    "weather_code,temperature_2m_max,temperature_2m_min".to_string(),
                ),
                ("temperature_unit", temperature_unit.to_string()),
                ("wind_speed_unit", wind_unit.to_string()),
                ("forecast_days", self.forecast_days.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let daily = forecast
            .daily
            .time
            .iter()
            .enumerate()
            .filter_map(|(i, date)| {
                Some(DailyForecast {
                    date: *date,
                    high: *forecast.daily.temperature_2m_max.get(i)?,
                    low: *forecast.daily.temperature_2m_min.get(i)?,
                    condition: describe_weather_code(*forecast.daily.weather_code.get(i)?)
                        .to_string(),
                })
            })
            .collect();

        let name = match place.country {
            Some(country) => format!("{}, {}", place.name, country),
            None => place.name,
        };

        Ok(WeatherSnapshot {
            location: name,
            temperature: forecast.current.temperature_2m,
            condition: describe_weather_code(forecast.current.weather_code).to_string(),
            humidity: forecast
                .current
                .relative_humidity_2m
                .map(|h| h.round().clamp(0.0, 100.0) as u8),
            wind_speed: forecast.current.wind_speed_10m,
            use_celsius,
            daily,
        })
    }
}

// ============================================================================
// Provider adapter
// ============================================================================

/// Weather as a single-provider source keyed by location
pub struct WeatherProvider {
    service: Arc<dyn WeatherService>,
    use_celsius: bool,
}

impl WeatherProvider {
    pub fn new(service: Arc<dyn WeatherService>, use_celsius: bool) -> Self {
        Self {
            service,
            use_celsius,
        }
    }
}

#[async_trait]
impl Provider for WeatherProvider {
    type Output = WeatherSnapshot;

    fn name(&self) -> &str {
        "open-meteo"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn supports(&self, key: &str) -> bool {
        !key.trim().is_empty()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, key: &str) -> Result<WeatherSnapshot> {
        self.service.fetch_weather(key, self.use_celsius).await
    }
}

// ============================================================================
// Fake (Testing)
// ============================================================================

/// Canned weather service. Counts calls and remembers the last location.
pub struct FakeWeatherService {
    snapshot: Option<WeatherSnapshot>,
    calls: AtomicUsize,
    last_location: Mutex<Option<String>>,
}

impl FakeWeatherService {
    pub fn returning(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
            last_location: Mutex::new(None),
        }
    }

    /// Every lookup fails with `LocationNotFound`
    pub fn unknown_location() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
            last_location: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_location(&self) -> Option<String> {
        self.last_location.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl WeatherService for FakeWeatherService {
    async fn fetch_weather(&self, location: &str, use_celsius: bool) -> Result<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_location.lock() {
            *last = Some(location.to_string());
        }
        let mut snapshot = self.snapshot.clone().ok_or(AugmentError::LocationNotFound)?;
        snapshot.use_celsius = use_celsius;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherSnapshot {
        WeatherSnapshot {
            location: "Boston, United States".to_string(),
            temperature: 12.5,
            condition: "Partly cloudy".to_string(),
            humidity: Some(60),
            wind_speed: Some(14.0),
            use_celsius: true,
            daily: vec![],
        }
    }

    #[test]
    fn test_weather_codes() {
        assert_eq!(describe_weather_code(0), "Clear sky");
        assert_eq!(describe_weather_code(81), "Rain showers");
        assert_eq!(describe_weather_code(500), "Unknown conditions");
    }

    #[test]
    fn test_units() {
        let mut snapshot = sample();
        assert_eq!(snapshot.unit(), "°C");
        snapshot.use_celsius = false;
        assert_eq!(snapshot.unit(), "°F");
        assert_eq!(snapshot.wind_unit(), "mph");
    }

    #[test]
    fn test_forecast_body_parses() {
        let body = r#"{
            "current": {"temperature_2m": 3.1, "relative_humidity_2m": 80, "weather_code": 71, "wind_speed_10m": 9.4},
            "daily": {
                "time": ["2026-01-05", "2026-01-06"],
                "weather_code": [71, 3],
                "temperature_2m_max": [4.0, 6.5],
                "temperature_2m_min": [-2.0, 0.5]
            }
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.current.weather_code, 71);
        assert_eq!(parsed.daily.time.len(), 2);
    }

    #[tokio::test]
    async fn test_provider_passes_unit_preference() {
        let service = Arc::new(FakeWeatherService::returning(sample()));
        let provider = WeatherProvider::new(service.clone(), false);
        let snapshot = provider.fetch("boston").await.unwrap();
        assert!(!snapshot.use_celsius);
        assert_eq!(service.last_location().as_deref(), Some("boston"));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let provider = WeatherProvider::new(Arc::new(FakeWeatherService::unknown_location()), true);
        assert!(matches!(
            provider.fetch("atlantis").await,
            Err(AugmentError::LocationNotFound)
        ));
    }
}
