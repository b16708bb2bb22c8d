//! Cached, optionally self-refreshing access layer for the OpenWeatherMap
//! current-weather API.
//!
//! The SDK keeps a bounded, TTL-limited, thread-safe cache of query
//! results per API key and serves callers from it:
//! 1. [`WeatherCache`] — bounded LRU map with per-entry time-to-live
//! 2. [`PollingService`] — background task re-fetching cached cities on
//!    a fixed cadence
//! 3. [`WeatherSdk`] — the per-credential façade tying cache, fetcher,
//!    and optional poller together
//! 4. [`SdkRegistry`] — singleton-per-API-key table so all callers
//!    sharing a credential share one cache and one poller
//!
//! The upstream query itself is an injected [`WeatherFetcher`];
//! [`OpenWeatherClient`] is the production implementation.

pub mod cache;
pub mod poller;
pub mod registry;
pub mod sdk;

pub use cache::WeatherCache;
pub use poller::PollingService;
pub use registry::SdkRegistry;
pub use sdk::{SdkMode, WeatherSdk, DEFAULT_POLLING_INTERVAL};

pub use common::{
    CacheConfig, Conditions, Error, Sun, Temperature, WeatherFetcher, WeatherReport, Wind,
};
pub use owm_client::OpenWeatherClient;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::DateTime;

    use common::{Conditions, Error, Sun, Temperature, WeatherFetcher, WeatherReport, Wind};

    pub fn sample_report(name: &str) -> WeatherReport {
        WeatherReport {
            weather: Conditions {
                main: "Clouds".into(),
                description: "scattered clouds".into(),
            },
            temperature: Temperature {
                temp: 280.0,
                feels_like: 278.5,
            },
            visibility: 10_000,
            wind: Wind { speed: 3.5 },
            datetime: DateTime::from_timestamp(1_600_000_000, 0).expect("valid timestamp"),
            sys: Sun {
                sunrise: DateTime::from_timestamp(1_600_000_000, 0).expect("valid timestamp"),
                sunset: DateTime::from_timestamp(1_600_030_000, 0).expect("valid timestamp"),
            },
            timezone: 3600,
            name: name.to_string(),
        }
    }

    /// Scripted fetcher: records every call and fails for selected cities.
    pub struct MockFetcher {
        calls: Mutex<Vec<String>>,
        fail_cities: HashSet<String>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::failing_for(&[])
        }

        pub fn failing_for(cities: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_cities: cities.iter().map(|c| c.to_string()).collect(),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().expect("mock lock").len()
        }

        pub fn calls_for(&self, city: &str) -> usize {
            self.calls
                .lock()
                .expect("mock lock")
                .iter()
                .filter(|c| c.as_str() == city)
                .count()
        }
    }

    #[async_trait]
    impl WeatherFetcher for MockFetcher {
        async fn fetch_current(&self, city: &str) -> Result<WeatherReport, Error> {
            self.calls.lock().expect("mock lock").push(city.to_string());
            if self.fail_cities.contains(city) {
                return Err(Error::Api(format!("scripted failure for {city}")));
            }
            Ok(sample_report(city))
        }
    }
}
