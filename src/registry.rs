//! Process-wide singleton-per-API-key table of SDK instances.
//!
//! All callers sharing a credential observe the same [`WeatherSdk`] —
//! and therefore the same cache and the same background poller. The
//! registry is an explicit handle callers construct and pass around,
//! not ambient global state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use common::{CacheConfig, Error, WeatherFetcher};
use owm_client::OpenWeatherClient;

use crate::sdk::{SdkMode, WeatherSdk};

#[derive(Default)]
pub struct SdkRegistry {
    instances: Mutex<HashMap<String, Arc<WeatherSdk>>>,
}

fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}...")
}

impl SdkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<WeatherSdk>>> {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the instance registered for `api_key`, constructing it
    /// first if absent. Construction happens while holding the table
    /// lock, so concurrent calls for one new key build exactly one
    /// instance (and exactly one poller).
    fn get_or_create_inner(
        &self,
        api_key: &str,
        mode: SdkMode,
        cache_config: Option<CacheConfig>,
        polling_interval: Option<Duration>,
        make_fetcher: impl FnOnce() -> Result<Arc<dyn WeatherFetcher>, Error>,
    ) -> Result<Arc<WeatherSdk>, Error> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "API key cannot be empty".to_string(),
            ));
        }

        let mut instances = self.lock();
        if let Some(existing) = instances.get(api_key) {
            return Ok(Arc::clone(existing));
        }

        info!(
            "Creating new WeatherSdk instance for API key {}",
            mask_key(api_key)
        );
        let sdk = Arc::new(WeatherSdk::new(
            make_fetcher()?,
            mode,
            cache_config,
            polling_interval,
        )?);
        instances.insert(api_key.to_string(), Arc::clone(&sdk));
        Ok(sdk)
    }

    /// Get-or-create with the production OpenWeatherMap fetcher.
    ///
    /// `Polling` mode starts a background task, so this must run within
    /// a tokio runtime.
    pub fn get_or_create(
        &self,
        api_key: &str,
        mode: SdkMode,
        cache_config: Option<CacheConfig>,
        polling_interval: Option<Duration>,
    ) -> Result<Arc<WeatherSdk>, Error> {
        self.get_or_create_inner(api_key, mode, cache_config, polling_interval, || {
            Ok(Arc::new(OpenWeatherClient::new(api_key)?) as Arc<dyn WeatherFetcher>)
        })
    }

    /// Get-or-create with an injected fetcher. Same semantics as
    /// [`get_or_create`](Self::get_or_create).
    pub fn get_or_create_with(
        &self,
        api_key: &str,
        fetcher: Arc<dyn WeatherFetcher>,
        mode: SdkMode,
        cache_config: Option<CacheConfig>,
        polling_interval: Option<Duration>,
    ) -> Result<Arc<WeatherSdk>, Error> {
        self.get_or_create_inner(api_key, mode, cache_config, polling_interval, || Ok(fetcher))
    }

    /// Removes and shuts down the instance for `api_key`. Returns `true`
    /// if one was registered. The removal happens under the table lock,
    /// so a racing `get_or_create` either sees the instance before this
    /// call or builds a fresh one after it — never an orphaned poller.
    pub async fn release(&self, api_key: &str) -> bool {
        let removed = self.lock().remove(api_key);

        match removed {
            Some(sdk) => {
                info!(
                    "Shutting down and releasing WeatherSdk instance for API key {}",
                    mask_key(api_key)
                );
                sdk.shutdown().await;
                true
            }
            None => {
                debug!(
                    "WeatherSdk instance for API key {} not found or already released",
                    mask_key(api_key)
                );
                false
            }
        }
    }

    /// Number of registered instances.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}
