//! Best-effort detection of the user's state and country.
//!
//! A [`PositionSource`] supplies coordinates, the [`ReverseGeocoder`] turns
//! them into an address. Every failure maps to one [`LocationError`] variant
//! with its own message; none of them stop the user from typing the fields.

pub mod geocode;
pub mod position;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

pub use geocode::ReverseGeocoder;
pub use position::{FixedPosition, IpPosition, PositionSource, parse_coordinates};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::PositionUnavailable);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location access was denied. Please enter your state and country manually.")]
    PermissionDenied,

    #[error("Location request timed out. Please try again or enter the details manually.")]
    Timeout,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("The address lookup service is unavailable. Please enter the details manually.")]
    ServiceUnavailable,

    #[error("Could not determine state and country from your location.")]
    AddressIncomplete,
}

impl LocationError {
    /// Classify a transport error from either location service.
    pub(crate) fn from_transport(err: &reqwest::Error, otherwise: LocationError) -> Self {
        if err.is_timeout() {
            LocationError::Timeout
        } else {
            otherwise
        }
    }
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn locate(&self) -> Result<Address, LocationError>;
}

/// Position source followed by reverse geocoding.
pub struct GeoLocator {
    position: Box<dyn PositionSource>,
    geocoder: ReverseGeocoder,
}

impl GeoLocator {
    pub fn new(position: Box<dyn PositionSource>, geocoder: ReverseGeocoder) -> Self {
        Self { position, geocoder }
    }
}

#[async_trait]
impl AddressLookup for GeoLocator {
    async fn locate(&self) -> Result<Address, LocationError> {
        let position = self.position.current_position().await.map_err(|e| {
            warn!("Could not determine position: {}", e);
            e
        })?;

        let address = self.geocoder.reverse(position).await.map_err(|e| {
            warn!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Reverse geocoding failed: {}",
                e
            );
            e
        })?;

        info!(state = %address.state, country = %address.country, "Detected location");
        Ok(address)
    }
}
