//! The upstream fetch capability consumed by the SDK core.

use async_trait::async_trait;

use crate::{Error, WeatherReport};

/// One synchronous query against the remote weather service.
///
/// Implementations call the upstream API and map its result or error;
/// they hold no cache and no background state. The SDK core treats every
/// failure uniformly as [`Error::Api`].
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    async fn fetch_current(&self, city: &str) -> Result<WeatherReport, Error>;
}
