use std::fmt::Display;

use chrono::TimeZone;

use crate::{
    assets::{Backdrop, scene_for},
    format::{calendar_date, day_name, time_of_day},
    model::{Units, WeatherReading},
};

/// Label used to pick the backdrop when the reading has no condition.
const DEFAULT_SCENE_LABEL: &str = "Clear";

/// Everything the dashboard shows for one reading, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub temperature: String,
    pub condition: String,
    pub max: String,
    pub min: String,
    pub humidity: String,
    pub wind_speed: String,
    pub sunrise: String,
    pub sunset: String,
    pub pressure: String,
    pub day: String,
    pub date: String,
    pub location: String,
    pub backdrop: Backdrop,
}

impl Screen {
    /// `location` is what the place line shows: the submitted query for a
    /// search, the payload's name for a coordinate lookup.
    pub fn compose<Tz>(reading: &WeatherReading, location: String, units: Units, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let deg = units.temperature_symbol();
        let observed = reading.observed_at.with_timezone(tz);
        let scene = scene_for(reading.condition.as_deref().unwrap_or(DEFAULT_SCENE_LABEL));

        Self {
            temperature: format!("{} {deg}", reading.temperature),
            condition: reading.condition_label().to_string(),
            max: format!("Max Temp: {} {deg}", reading.temperature_max),
            min: format!("Min Temp: {} {deg}", reading.temperature_min),
            humidity: format!("{} %", reading.humidity_pct),
            wind_speed: format!("{} {}", reading.wind_speed, units.wind_symbol()),
            sunrise: time_of_day(reading.sunrise, tz),
            sunset: time_of_day(reading.sunset, tz),
            pressure: format!("{} hPa", reading.pressure_hpa),
            day: day_name(&observed),
            date: calendar_date(&observed),
            location,
            backdrop: Backdrop::playing(scene),
        }
    }
}
