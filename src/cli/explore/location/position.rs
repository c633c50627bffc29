use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use winnow::ascii::{float, space0};
use winnow::combinator::{delimited, separated_pair};
use winnow::{ModalResult, Parser};

use super::{LocationError, Position};

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Position, LocationError>;
}

/// Coordinates the user typed in.
pub struct FixedPosition(pub Position);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Position, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from an IP geolocation service that answers with
/// `latitude` and `longitude` fields.
pub struct IpPosition {
    url: String,
    client: reqwest::Client,
}

impl IpPosition {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl PositionSource for IpPosition {
    async fn current_position(&self) -> Result<Position, LocationError> {
        debug!("Requesting position from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::from_transport(&e, LocationError::PositionUnavailable))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LocationError::PermissionDenied)
            }
            status if !status.is_success() => return Err(LocationError::PositionUnavailable),
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LocationError::from_transport(&e, LocationError::PositionUnavailable))?;

        position_from_json(&body)
    }
}

/// Read `latitude`/`longitude` (numbers or numeric strings) from a position
/// service reply.
pub fn position_from_json(body: &Value) -> Result<Position, LocationError> {
    let coordinate = |key: &str| -> Option<f64> {
        match body.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };

    match (coordinate("latitude"), coordinate("longitude")) {
        (Some(latitude), Some(longitude)) => Position::new(latitude, longitude),
        _ => Err(LocationError::PositionUnavailable),
    }
}

/// Parse `LAT,LON` in decimal degrees, e.g. `19.07, 72.88`.
pub fn parse_coordinates(input: &str) -> Result<Position, LocationError> {
    let (latitude, longitude) = coordinates
        .parse(input.trim())
        .map_err(|_| LocationError::PositionUnavailable)?;
    Position::new(latitude, longitude)
}

fn coordinates(input: &mut &str) -> ModalResult<(f64, f64)> {
    separated_pair(float, delimited(space0, ',', space0), float).parse_next(input)
}
