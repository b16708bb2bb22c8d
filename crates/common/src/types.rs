//! Weather record types returned by the SDK.
//!
//! These are immutable value types: the cache replaces entries wholesale
//! and hands out clones, never references into shared state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The weather record for one city, as exposed to SDK callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// General conditions (e.g. "Clouds" / "scattered clouds").
    pub weather: Conditions,
    /// Actual and perceived temperature, in the API's standard units (K).
    pub temperature: Temperature,
    /// Visibility in meters.
    pub visibility: i64,
    pub wind: Wind,
    /// Observation time (UTC).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub datetime: DateTime<Utc>,
    pub sys: Sun,
    /// UTC offset of the location, in seconds.
    pub timezone: i32,
    /// Resolved location name as reported by the API.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Wind speed in m/s.
    pub speed: f64,
}

/// Sunrise/sunset times (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub sunrise: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub sunset: DateTime<Utc>,
}
