//! One-shot device location.
//!
//! [`LocationWatcher::request_once`] asks the source for authorization and a
//! single coarse fix, publishes it, and stops the source again.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::models::Coordinate;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location access was denied")]
    Denied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    AuthorizedWhenInUse,
    AuthorizedAlways,
    Denied,
    NotDetermined,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedWhenInUse | AuthorizationStatus::AuthorizedAlways
        )
    }
}

/// Desired accuracy of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Best,
    HundredMeters,
    Kilometer,
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn request_when_in_use_authorization(&self) -> AuthorizationStatus;

    /// Zero or one fix.
    async fn request_location(&self, accuracy: Accuracy)
    -> Result<Option<Coordinate>, LocationError>;

    async fn stop_updating(&self);
}

/// A source that always reports the same position, or nothing.
#[derive(Debug, Clone)]
pub struct FixedLocationSource {
    status: AuthorizationStatus,
    fix: Option<Coordinate>,
}

impl FixedLocationSource {
    pub fn new(fix: Option<Coordinate>) -> Self {
        Self {
            status: AuthorizationStatus::AuthorizedWhenInUse,
            fix,
        }
    }

    pub fn denied() -> Self {
        Self {
            status: AuthorizationStatus::Denied,
            fix: None,
        }
    }

    pub fn with_status(mut self, status: AuthorizationStatus) -> Self {
        self.status = status;
        self
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn request_when_in_use_authorization(&self) -> AuthorizationStatus {
        self.status
    }

    async fn request_location(
        &self,
        _accuracy: Accuracy,
    ) -> Result<Option<Coordinate>, LocationError> {
        if !self.status.is_authorized() {
            return Err(LocationError::Denied);
        }
        Ok(self.fix)
    }

    async fn stop_updating(&self) {}
}

#[derive(Clone)]
pub struct LocationWatcher {
    source: Arc<dyn LocationSource>,
    tx: Arc<watch::Sender<Option<Coordinate>>>,
}

impl LocationWatcher {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            source,
            tx: Arc::new(tx),
        }
    }

    /// Receiver for the published fix. Stays `None` until a fix arrives.
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinate>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Coordinate> {
        *self.tx.borrow()
    }

    /// Requests a single coarse fix in the background.
    pub fn request_once(&self) -> tokio::task::JoinHandle<()> {
        let source = self.source.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            info!("Requesting authorization and location");

            let status = source.request_when_in_use_authorization().await;
            if !status.is_authorized() {
                warn!("Not authorized for location ({status:?})");
                return;
            }

            match source.request_location(Accuracy::Kilometer).await {
                Ok(Some(fix)) => {
                    info!("Location received! Stopping location service.");
                    tx.send_replace(Some(fix));
                }
                Ok(None) => warn!("Location request finished without a fix"),
                Err(e) => error!("Error from location source: {e}"),
            }

            source.stop_updating().await;
        })
    }
}
