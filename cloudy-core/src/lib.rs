//! Core library for the `cloudy` weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider abstraction and its OpenWeather client
//! - Location sources and periodic location updates
//! - Condition-to-asset mapping and screen formatting
//! - The dashboard that ties location, searches and readings together
//!
//! It is used by `cloudy-cli`, but can also be driven by other front ends.

pub mod assets;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod location;
pub mod model;
pub mod provider;
pub mod screen;

pub use config::{Config, LocationConfig, LocationSourceConfig};
pub use dashboard::{Dashboard, DashboardHandle, DashboardSettings, DashboardState, Mode};
pub use location::{LocationSource, Permission};
pub use model::{LocationFix, Units, WeatherReading, WeatherRequest};
pub use provider::{WeatherError, WeatherProvider};
pub use screen::Screen;
