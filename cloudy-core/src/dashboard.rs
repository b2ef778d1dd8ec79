//! The single control point of the app: owns the displayed reading, reacts
//! to location fixes and search submissions, and applies weather results one
//! at a time.

use std::{sync::Arc, time::Duration};

use chrono::Local;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    location::{LocationSource, LocationSubscription, Permission},
    model::{LocationFix, Units, WeatherReading, WeatherRequest},
    provider::{WeatherError, WeatherProvider},
    screen::Screen,
};

const FIX_BUFFER: usize = 1;
const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Weather follows the device location.
    #[default]
    AutoLocation,
    /// The user searched for a place; location tracking is off for good.
    ManualSearch,
}

/// What the view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub mode: Mode,
    pub screen: Option<Screen>,
    /// Bumped every time a reading is applied to the screen.
    pub revision: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DashboardSettings {
    pub units: Units,
    pub poll_interval: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            units: Units::Metric,
            poll_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
enum Command {
    Search(String),
    Shutdown,
}

#[derive(Debug)]
enum Origin {
    Location,
    Search(String),
}

#[derive(Debug)]
struct Completion {
    seq: u64,
    origin: Origin,
    result: Result<WeatherReading, WeatherError>,
}

enum Event {
    Command(Option<Command>),
    Fix(LocationFix),
    Completed(Completion),
}

/// Handle to a running dashboard. Dropping it shuts the dashboard down.
#[derive(Debug)]
pub struct DashboardHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<DashboardState>,
    task: JoinHandle<()>,
}

impl DashboardHandle {
    /// Submit a place-name query, as typed into the search box.
    pub async fn search(&self, query: impl Into<String>) -> anyhow::Result<()> {
        self.commands
            .send(Command::Search(query.into()))
            .await
            .map_err(|_| anyhow::anyhow!("Dashboard is no longer running"))
    }

    pub fn state(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// Stop location updates and wait for the dashboard to exit. Requests
    /// still in flight are abandoned.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.commands.send(Command::Shutdown).await;
        self.task
            .await
            .map_err(|err| anyhow::anyhow!("Dashboard task failed: {err}"))
    }
}

pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    settings: DashboardSettings,
    mode: Mode,
    subscription: Option<LocationSubscription>,
    fixes: Option<mpsc::Receiver<LocationFix>>,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    state: watch::Sender<DashboardState>,
    next_seq: u64,
    applied_seq: u64,
}

impl Dashboard {
    /// Start the dashboard in automatic-location mode.
    ///
    /// If the location permission was denied, tracking never starts and the
    /// dashboard only reacts to searches.
    pub fn spawn(
        provider: Arc<dyn WeatherProvider>,
        location: Arc<dyn LocationSource>,
        settings: DashboardSettings,
    ) -> DashboardHandle {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(DashboardState::default());

        let (subscription, fixes) = match location.permission() {
            Permission::Granted => {
                let (fix_tx, fix_rx) = mpsc::channel(FIX_BUFFER);
                let sub = LocationSubscription::start(location, settings.poll_interval, fix_tx);
                (Some(sub), Some(fix_rx))
            }
            Permission::Denied => {
                error!("Permission denied, automatic location tracking halted");
                (None, None)
            }
        };

        let dashboard = Dashboard {
            provider,
            settings,
            mode: Mode::AutoLocation,
            subscription,
            fixes,
            commands,
            completions_tx,
            completions,
            state,
            next_seq: 0,
            applied_seq: 0,
        };

        DashboardHandle {
            commands: commands_tx,
            state: state_rx,
            task: tokio::spawn(dashboard.run()),
        }
    }

    async fn run(mut self) {
        info!("Dashboard started");

        loop {
            let event = tokio::select! {
                command = self.commands.recv() => Event::Command(command),
                fix = next_fix(&mut self.fixes) => Event::Fix(fix),
                Some(done) = self.completions.recv() => Event::Completed(done),
            };

            match event {
                Event::Command(Some(Command::Search(query))) => self.submit_search(query).await,
                Event::Command(Some(Command::Shutdown) | None) => break,
                Event::Fix(fix) => self.on_fix(fix),
                Event::Completed(done) => self.apply(done),
            }
        }

        self.stop_tracking().await;
        info!("Dashboard stopped");
    }

    fn on_fix(&mut self, fix: LocationFix) {
        if self.mode != Mode::AutoLocation {
            return;
        }
        debug!(%fix, "Auto location");
        self.dispatch(Origin::Location, WeatherRequest::Coordinates(fix));
    }

    async fn submit_search(&mut self, query: String) {
        if query.trim().is_empty() {
            debug!("Ignoring empty search");
            return;
        }

        if self.mode == Mode::AutoLocation {
            self.mode = Mode::ManualSearch;
            self.stop_tracking().await;
            self.state.send_modify(|state| state.mode = Mode::ManualSearch);
            info!("Auto-tracking stopped after search");
        }

        self.dispatch(
            Origin::Search(query.clone()),
            WeatherRequest::Place(query),
        );
    }

    async fn stop_tracking(&mut self) {
        self.fixes = None;
        if let Some(subscription) = self.subscription.take() {
            subscription.stop().await;
        }
    }

    fn dispatch(&mut self, origin: Origin, request: WeatherRequest) {
        self.next_seq += 1;
        let seq = self.next_seq;
        let provider = Arc::clone(&self.provider);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = provider.get_weather(&request).await;
            // The dashboard may be gone by now; the result is simply dropped.
            let _ = completions.send(Completion {
                seq,
                origin,
                result,
            });
        });
    }

    fn apply(&mut self, done: Completion) {
        let reading = match done.result {
            Ok(reading) => reading,
            Err(err) => {
                warn!(seq = done.seq, error = %err, "Weather request failed");
                return;
            }
        };

        if matches!(done.origin, Origin::Location) && self.mode == Mode::ManualSearch {
            debug!(seq = done.seq, "Discarding location result after manual search");
            return;
        }
        if done.seq <= self.applied_seq {
            debug!(seq = done.seq, applied = self.applied_seq, "Discarding stale result");
            return;
        }
        self.applied_seq = done.seq;

        let location = match done.origin {
            Origin::Search(query) => query,
            Origin::Location => reading.place_name.clone(),
        };
        let screen = Screen::compose(&reading, location, self.settings.units, &Local);

        self.state.send_modify(|state| {
            state.screen = Some(screen);
            state.revision += 1;
        });
    }
}

/// Next fix from the subscription, or pending forever once tracking is off.
async fn next_fix(fixes: &mut Option<mpsc::Receiver<LocationFix>>) -> LocationFix {
    if let Some(rx) = fixes.as_mut() {
        if let Some(fix) = rx.recv().await {
            return fix;
        }
    }
    *fixes = None;
    std::future::pending().await
}
