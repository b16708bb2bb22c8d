//! Shared types for the OpenWeather SDK.
//!
//! Leaf crate holding the unified error type, the weather record shapes,
//! cache configuration, and the fetcher capability trait consumed by the
//! SDK core.

pub mod config;
pub mod error;
pub mod fetch;
pub mod types;

pub use config::CacheConfig;
pub use error::Error;
pub use fetch::WeatherFetcher;
pub use types::{Conditions, Sun, Temperature, WeatherReport, Wind};
