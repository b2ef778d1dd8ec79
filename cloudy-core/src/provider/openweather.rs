use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::{Units, WeatherReading, WeatherRequest};

use super::{WeatherError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Client for OpenWeather's current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, units: Units) -> Self {
        Self {
            api_key,
            base_url,
            units,
            http: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/weather", self.base_url.trim_end_matches('/'))
    }

    async fn fetch(&self, params: &[(&str, String)]) -> Result<WeatherReading, WeatherError> {
        let res = self
            .http
            .get(self.endpoint())
            .query(params)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(WeatherError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Transport)?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        debug!(place = %parsed.name, "Received OpenWeather payload");

        Ok(parsed.into_reading())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: f64,
    sea_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_reading(self) -> WeatherReading {
        let observed_at = DateTime::<Utc>::from_timestamp(self.dt, 0).unwrap_or_else(Utc::now);

        WeatherReading {
            place_name: self.name,
            temperature: self.main.temp,
            temperature_min: self.main.temp_min,
            temperature_max: self.main.temp_max,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.sea_level.unwrap_or(self.main.pressure),
            wind_speed: self.wind.speed,
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
            condition: self.weather.into_iter().next().map(|w| w.main),
            observed_at,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReading, WeatherError> {
        match request {
            WeatherRequest::Place(place) => self.fetch(&[("q", place.clone())]).await,
            WeatherRequest::Coordinates(fix) => {
                self.fetch(&[
                    ("lat", fix.latitude.to_string()),
                    ("lon", fix.longitude.to_string()),
                ])
                .await
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
