//! Device location: where fixes come from, and the periodic subscription
//! that feeds them to the dashboard.

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::{LocationConfig, LocationSourceConfig},
    model::LocationFix,
};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

/// Whether the user allowed the app to read their location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location lookup failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Location lookup failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to parse location response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,
}

#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    fn permission(&self) -> Permission;

    async fn current_fix(&self) -> Result<LocationFix, LocationError>;
}

/// Always reports the same coordinates.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    fix: LocationFix,
    permission: Permission,
}

impl FixedLocation {
    pub fn new(fix: LocationFix, permission: Permission) -> Result<Self, LocationError> {
        if !fix.is_valid() {
            return Err(LocationError::InvalidCoordinates);
        }
        Ok(Self { fix, permission })
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    fn permission(&self) -> Permission {
        self.permission
    }

    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        if self.permission == Permission::Denied {
            return Err(LocationError::PermissionDenied);
        }
        Ok(self.fix)
    }
}

/// Approximates the device position from its public IP address.
#[derive(Debug, Clone)]
pub struct IpLocation {
    url: String,
    permission: Permission,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpLocation {
    pub fn new(url: String, permission: Permission) -> Self {
        Self {
            url,
            permission,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl LocationSource for IpLocation {
    fn permission(&self) -> Permission {
        self.permission
    }

    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        if self.permission == Permission::Denied {
            return Err(LocationError::PermissionDenied);
        }

        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(LocationError::Transport)?;

        if !res.status().is_success() {
            return Err(LocationError::Status(res.status()));
        }

        let text = res.text().await.map_err(LocationError::Transport)?;
        let body: IpLookupResponse = serde_json::from_str(&text)?;

        if body.status != "success" {
            return Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(LocationError::Unavailable("response had no coordinates".into()));
        };

        let fix = LocationFix::new(lat, lon);
        if !fix.is_valid() {
            return Err(LocationError::InvalidCoordinates);
        }
        Ok(fix)
    }
}

/// Build the configured location source. `permission` is the user's answer
/// to the permission prompt.
pub fn location_source_from_config(
    config: &LocationConfig,
    permission: Permission,
) -> Result<Arc<dyn LocationSource>, LocationError> {
    let source: Arc<dyn LocationSource> = match &config.source {
        LocationSourceConfig::Ip { url } => Arc::new(IpLocation::new(url.clone(), permission)),
        LocationSourceConfig::Fixed {
            latitude,
            longitude,
        } => Arc::new(FixedLocation::new(
            LocationFix::new(*latitude, *longitude),
            permission,
        )?),
    };
    Ok(source)
}

/// Periodic location updates. The first fix is requested immediately, then
/// once per interval, until cancelled or dropped.
#[derive(Debug)]
pub struct LocationSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LocationSubscription {
    pub fn start(
        source: Arc<dyn LocationSource>,
        interval: Duration,
        fixes: mpsc::Sender<LocationFix>,
    ) -> Self {
        info!(interval_secs = interval.as_secs(), "Starting location updates");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_location(source, interval, fixes, cancel.clone()));

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop updates and wait for the polling task to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "Location polling task ended abnormally");
            }
        }
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_location(
    source: Arc<dyn LocationSource>,
    interval: Duration,
    fixes: mpsc::Sender<LocationFix>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = source.current_fix() => result,
        };

        match result {
            Ok(fix) => {
                debug!(%fix, "Location update");
                match fixes.try_send(fix) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("Dropping location fix, previous one not yet consumed");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
            Err(LocationError::PermissionDenied) => {
                warn!("Location permission denied, stopping location updates");
                break;
            }
            Err(err) => warn!(error = %err, "Location unavailable"),
        }
    }

    debug!("Location updates stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationSource for CountingSource {
        fn permission(&self) -> Permission {
            Permission::Granted
        }

        async fn current_fix(&self) -> Result<LocationFix, LocationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LocationFix::new(n as f64, 0.0))
        }
    }

    #[test]
    fn fixed_location_rejects_invalid_coordinates() {
        let err = FixedLocation::new(LocationFix::new(120.0, 0.0), Permission::Granted).unwrap_err();
        assert!(matches!(err, LocationError::InvalidCoordinates));
    }

    #[tokio::test]
    async fn fixed_location_refuses_without_permission() {
        let source = FixedLocation::new(LocationFix::new(1.0, 2.0), Permission::Denied).unwrap();
        assert!(matches!(
            source.current_fix().await,
            Err(LocationError::PermissionDenied)
        ));
    }

    #[test]
    fn builds_source_from_config() {
        let mut cfg = LocationConfig::default();
        let source = location_source_from_config(&cfg, Permission::Granted).unwrap();
        assert_eq!(source.permission(), Permission::Granted);

        cfg.source = LocationSourceConfig::Fixed {
            latitude: 0.0,
            longitude: 500.0,
        };
        assert!(location_source_from_config(&cfg, Permission::Granted).is_err());
    }

    #[tokio::test]
    async fn subscription_delivers_first_fix_immediately() {
        let source = Arc::new(CountingSource::default());
        let (tx, mut rx) = mpsc::channel(4);

        let sub = LocationSubscription::start(source, Duration::from_secs(3600), tx);
        let fix = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("first fix should arrive without waiting an interval")
            .expect("channel open");

        assert_eq!(fix, LocationFix::new(0.0, 0.0));
        sub.stop().await;
    }

    #[tokio::test]
    async fn stopped_subscription_sends_nothing_more() {
        let source = Arc::new(CountingSource::default());
        let (tx, mut rx) = mpsc::channel(16);

        let sub = LocationSubscription::start(source.clone(), Duration::from_millis(10), tx);
        rx.recv().await.expect("first fix");
        sub.stop().await;

        let calls = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);

        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none(), "sender must be gone once stopped");
    }
}
