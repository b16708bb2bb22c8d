//! OpenWeatherMap API client.
//!
//! Fetches current-weather observations from the OpenWeatherMap
//! `data/2.5/weather` endpoint and converts them to the shared
//! `WeatherReport` format.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use common::{Conditions, Error, Sun, Temperature, WeatherFetcher, WeatherReport, Wind};

const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const UNITS: &str = "standard";

/// OpenWeatherMap API client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
}

// ── OpenWeather response types ────────────────────────────────────────

/// Raw response from `data/2.5/weather`.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    #[serde(default)]
    pub weather: Vec<ConditionRow>,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: i64,
    #[serde(default)]
    pub wind: Option<WindReading>,
    pub dt: i64,
    #[serde(default)]
    pub sys: Option<SysBlock>,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionRow {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindReading {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SysBlock {
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

impl OpenWeatherClient {
    pub fn new(api_key: &str) -> Result<Self, Error> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent("openweather-sdk/0.1 (contact@example.com)")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    /// Fetch the raw current-weather payload for a city.
    pub async fn fetch_raw(&self, city: &str) -> Result<CurrentWeatherResponse, Error> {
        let query = [
            ("q", city.to_string()),
            ("appid", self.api_key.clone()),
            ("units", UNITS.to_string()),
        ];

        debug!("Fetching current weather: {} city={}", WEATHER_URL, city);

        let resp = self
            .client
            .get(WEATHER_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Api(format!("network error for {city}: {e}")))?;

        let status = resp.status().as_u16();
        check_status(status, city)?;

        resp.json::<CurrentWeatherResponse>()
            .await
            .map_err(|e| Error::Api(format!("JSON parse error for {city}: {e}")))
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn fetch_current(&self, city: &str) -> Result<WeatherReport, Error> {
        let raw = self.fetch_raw(city).await?;
        convert_response(raw)
    }
}

/// Maps upstream HTTP status codes onto the single API error kind.
fn check_status(status: u16, city: &str) -> Result<(), Error> {
    match status {
        200 => Ok(()),
        401 => Err(Error::Api(format!(
            "unauthorized: invalid API key or request format (status {status})"
        ))),
        404 => Err(Error::Api(format!(
            "city not found or invalid request parameter: {city} (status {status})"
        ))),
        429 => Err(Error::Api(format!(
            "rate limit exceeded, too many requests (status {status})"
        ))),
        500..=599 => Err(Error::Api(format!(
            "upstream server error, please try again later (status {status})"
        ))),
        _ => Err(Error::Api(format!(
            "unexpected response for {city} (status {status})"
        ))),
    }
}

fn ts(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Api(format!("timestamp {secs} out of range in response")))
}

/// Converts a raw API payload into the unified `WeatherReport`.
pub fn convert_response(raw: CurrentWeatherResponse) -> Result<WeatherReport, Error> {
    let condition = raw
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| Error::Api("malformed response: no weather conditions".to_string()))?;

    let sys = raw.sys.unwrap_or(SysBlock {
        sunrise: 0,
        sunset: 0,
    });

    Ok(WeatherReport {
        weather: Conditions {
            main: condition.main,
            description: condition.description,
        },
        temperature: Temperature {
            temp: raw.main.temp,
            feels_like: raw.main.feels_like,
        },
        visibility: raw.visibility,
        wind: Wind {
            speed: raw.wind.map(|w| w.speed).unwrap_or_default(),
        },
        datetime: ts(raw.dt)?,
        sys: Sun {
            sunrise: ts(sys.sunrise)?,
            sunset: ts(sys.sunset)?,
        },
        timezone: raw.timezone,
        name: raw.name,
    })
}
