//! "Use my location" capability.
//!
//! A position request is single-shot and may be denied or unavailable.
//! The orchestrator treats the capability as optional.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::model::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Reports a fixed position, e.g. the one stored in the config file or
/// passed on the command line.
#[derive(Debug, Clone, Copy)]
pub struct StaticGeolocator {
    position: Coordinates,
}

impl StaticGeolocator {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }

    /// `None` when no position is known, meaning the capability is absent.
    pub fn from_option(position: Option<Coordinates>) -> Option<Self> {
        position.map(Self::new)
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let Coordinates { latitude, longitude } = self.position;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeolocationError::Unavailable);
        }
        Ok(self.position)
    }
}
