use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{Address, LocationError, Position};

/// Address keys that may hold the first-level administrative division, most
/// specific naming scheme first.
const STATE_KEYS: [&str; 4] = ["state", "province", "region", "state_district"];

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client for a Nominatim-compatible `/reverse` endpoint.
pub struct ReverseGeocoder {
    base_url: String,
    client: reqwest::Client,
}

impl ReverseGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn reverse_url(&self, position: Position) -> Result<Url, LocationError> {
        let endpoint = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(
            &endpoint,
            &[
                ("format", "json".to_string()),
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ],
        )
        .map_err(|_| LocationError::ServiceUnavailable)
    }

    pub async fn reverse(&self, position: Position) -> Result<Address, LocationError> {
        let url = self.reverse_url(position)?;
        debug!("Reverse geocoding via {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LocationError::from_transport(&e, LocationError::ServiceUnavailable))?;

        if !response.status().is_success() {
            return Err(LocationError::ServiceUnavailable);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LocationError::from_transport(&e, LocationError::ServiceUnavailable))?;

        address_from_json(&body)
    }
}

/// Extract state and country from a reverse-geocoding reply.
pub fn address_from_json(body: &Value) -> Result<Address, LocationError> {
    let address = body.get("address").ok_or(LocationError::AddressIncomplete)?;

    let text = |key: &str| {
        address
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let state = STATE_KEYS.iter().find_map(|&key| text(key));
    let country = text("country");

    match (state, country) {
        (Some(state), Some(country)) => Ok(Address { state, country }),
        _ => Err(LocationError::AddressIncomplete),
    }
}
