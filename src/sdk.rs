//! The per-credential SDK façade.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use common::{CacheConfig, Error, WeatherFetcher, WeatherReport};

use crate::cache::WeatherCache;
use crate::poller::PollingService;

/// Update strategy for cached weather data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkMode {
    /// Entries age out per TTL and are refreshed only by caller requests.
    OnDemand,
    /// A background poller keeps every currently cached city fresh.
    Polling,
}

/// Default cadence for [`SdkMode::Polling`].
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(8 * 60);

/// Cached access to the current weather of a city, bound to one API key.
///
/// Answers `current_weather` from the cache when it can and falls back
/// to one synchronous fetch otherwise. In [`SdkMode::Polling`] a
/// [`PollingService`] bound to the same cache and fetcher is started at
/// construction; creating a polling instance therefore requires a tokio
/// runtime.
pub struct WeatherSdk {
    fetcher: Arc<dyn WeatherFetcher>,
    cache: Arc<WeatherCache>,
    mode: SdkMode,
    poller: Option<PollingService>,
}

impl WeatherSdk {
    pub fn new(
        fetcher: Arc<dyn WeatherFetcher>,
        mode: SdkMode,
        cache_config: Option<CacheConfig>,
        polling_interval: Option<Duration>,
    ) -> Result<Self, Error> {
        let config = cache_config.unwrap_or_default();
        config.validate()?;

        let cache = Arc::new(WeatherCache::new(config.max_entries, config.ttl())?);

        let poller = match mode {
            SdkMode::Polling => {
                let interval = polling_interval.unwrap_or(DEFAULT_POLLING_INTERVAL);
                let poller =
                    PollingService::new(Arc::clone(&cache), Arc::clone(&fetcher), interval)?;
                poller.start();
                Some(poller)
            }
            SdkMode::OnDemand => None,
        };

        Ok(Self {
            fetcher,
            cache,
            mode,
            poller,
        })
    }

    /// Current weather for `city`: cache hit, or one synchronous fetch
    /// that populates the cache. Fetch failures propagate unchanged —
    /// retries, if any, belong to the caller or the poller.
    pub async fn current_weather(&self, city: &str) -> Result<WeatherReport, Error> {
        if city.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "city name cannot be empty".to_string(),
            ));
        }

        if let Some(report) = self.cache.get(city) {
            debug!("Cache hit for {}", city);
            return Ok(report);
        }

        let report = self.fetcher.fetch_current(city).await?;
        self.cache.put(city, report.clone());
        Ok(report)
    }

    /// Stops background polling, if any. Safe to call repeatedly;
    /// `current_weather` keeps working afterwards.
    pub async fn shutdown(&self) {
        if let Some(poller) = &self.poller {
            poller.stop().await;
        }
        info!("Weather SDK instance shut down");
    }

    pub fn mode(&self) -> SdkMode {
        self.mode
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    pub fn poller(&self) -> Option<&PollingService> {
        self.poller.as_ref()
    }
}
