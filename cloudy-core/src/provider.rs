use crate::{Config, WeatherReading, WeatherRequest, model::Units};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Failure of a single weather request. None of these are retried.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No connectivity, DNS failure, connection reset and the like.
    #[error("Failed to reach weather service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Weather request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// A successful response whose body is not a weather payload.
    #[error("Failed to parse weather response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReading, WeatherError>;
}

/// Construct the provider from config, optionally overriding the configured units.
pub fn provider_from_config(
    config: &Config,
    units: Option<Units>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    Ok(Box::new(OpenWeatherProvider::new(
        api_key.to_owned(),
        config.effective_base_url().to_string(),
        units.unwrap_or(config.units),
    )))
}
