use std::{io::Write as _, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use cloudy_core::{
    Config, Dashboard, DashboardSettings, LocationFix, LocationSourceConfig, Permission, Screen,
    Units, WeatherRequest,
    location::location_source_from_config,
    provider::{openweather::DEFAULT_BASE_URL, provider_from_config},
};
use inquire::{Confirm, CustomType, Password, Select, Text};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cloudy", version, about = "Current weather in your terminal")]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Unit system: metric, imperial or standard. Defaults to the configured one.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, endpoint, units and location source.
    Configure,

    /// Show the current weather once.
    Show {
        /// Place name, e.g. "Lisbon" or "Paris,FR".
        #[arg(required_unless_present = "lat", conflicts_with_all = ["lat", "lon"])]
        place: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Live dashboard following your location. Type a place to search instead.
    Watch {
        /// Seconds between location updates. Defaults to the configured interval.
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|err| err.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { place, lat, lon } => {
                let request = match (place, lat, lon) {
                    (Some(place), _, _) => WeatherRequest::Place(place),
                    (None, Some(lat), Some(lon)) => {
                        let fix = LocationFix::new(lat, lon);
                        if !fix.is_valid() {
                            bail!("Invalid coordinates: {fix}");
                        }
                        WeatherRequest::Coordinates(fix)
                    }
                    _ => bail!("Give a place name or both --lat and --lon"),
                };
                show(request, self.units).await
            }
            Command::Watch { interval } => watch(self.units, interval).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("API key prompt aborted")?;
    if !api_key.trim().is_empty() {
        cfg.set_api_key(api_key.trim().to_string());
    }

    cfg.base_url = Text::new("Weather endpoint:")
        .with_default(&cfg.base_url)
        .with_help_message(DEFAULT_BASE_URL)
        .prompt()
        .context("Endpoint prompt aborted")?;

    cfg.units = Select::new("Units:", Units::all().to_vec())
        .prompt()
        .context("Units prompt aborted")?;

    let sources = vec!["IP address lookup", "Fixed coordinates"];
    let choice = Select::new("Location source:", sources)
        .prompt()
        .context("Location source prompt aborted")?;

    if choice == "Fixed coordinates" {
        let latitude = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Latitude prompt aborted")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Longitude prompt aborted")?;
        let fix = LocationFix::new(latitude, longitude);
        if !fix.is_valid() {
            bail!("Invalid coordinates: {fix}");
        }
        cfg.location.source = LocationSourceConfig::fixed(fix);
    } else {
        cfg.location.source = LocationSourceConfig::default();
    }

    cfg.location.permission = Some(ask_location_permission()?);

    let path = cfg.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn ask_location_permission() -> Result<Permission> {
    let allowed = Confirm::new("Allow cloudy to use your location?")
        .with_default(true)
        .prompt()
        .context("Location permission prompt aborted")?;

    Ok(if allowed {
        Permission::Granted
    } else {
        Permission::Denied
    })
}

async fn show(request: WeatherRequest, units: Option<Units>) -> Result<()> {
    let cfg = Config::load()?;
    let units = units.unwrap_or(cfg.units);
    let provider = provider_from_config(&cfg, Some(units))?;

    let reading = provider
        .get_weather(&request)
        .await
        .context("Failed to fetch current weather")?;

    let location = match request {
        WeatherRequest::Place(place) => place,
        WeatherRequest::Coordinates(_) => reading.place_name.clone(),
    };
    let screen = Screen::compose(&reading, location, units, &Local);

    print!("{}", render::render(&screen));
    Ok(())
}

async fn watch(units: Option<Units>, interval: Option<u64>) -> Result<()> {
    let mut cfg = Config::load()?;
    let units = units.unwrap_or(cfg.units);
    let provider = provider_from_config(&cfg, Some(units))?;

    let permission = match cfg.location.permission {
        Some(permission) => permission,
        None => {
            let permission = ask_location_permission()?;
            cfg.location.permission = Some(permission);
            cfg.save()?;
            permission
        }
    };

    let location = location_source_from_config(&cfg.location, permission)
        .context("Invalid location configuration")?;

    let settings = DashboardSettings {
        units,
        poll_interval: interval
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| cfg.location.poll_interval()),
    };

    let handle = Dashboard::spawn(Arc::from(provider), location, settings);
    let mut state = handle.state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut drawn = 0;

    println!("Waiting for weather... type a place and press Enter to search.");

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = {
                    let current = state.borrow_and_update();
                    match &current.screen {
                        Some(screen) if current.revision != drawn => {
                            drawn = current.revision;
                            Some(render::redraw(screen))
                        }
                        _ => None,
                    }
                };
                if let Some(frame) = frame {
                    print!("{frame}");
                    std::io::stdout().flush().context("Failed to write to terminal")?;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(query)) => handle.search(query.trim()).await?,
                    Ok(None) => stdin_open = false,
                    Err(err) => {
                        warn!(error = %err, "Failed to read search input");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown().await
}
