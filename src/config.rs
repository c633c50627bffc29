use std::env;
use std::str::FromStr;
use std::time::Duration;

use eyre::{Result, eyre};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_POSITION_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 10;

/// Sampling parameters sent with every `generateContent` call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Not checked here; a missing key only fails when a request is made.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone)]
pub struct LocationConfig {
    pub position_url: String,
    pub geocoder_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub location: LocationConfig,
}

impl Config {
    /// Build the configuration from process environment variables.
    ///
    /// Call `dotenv()` first if `.env` files should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = GenerationConfig::default();

        let generation = GenerationConfig {
            temperature: parse_or(&get, "GEMINI_TEMPERATURE", defaults.temperature)?,
            top_p: parse_or(&get, "GEMINI_TOP_P", defaults.top_p)?,
            top_k: parse_or(&get, "GEMINI_TOP_K", defaults.top_k)?,
            max_output_tokens: parse_or(&get, "GEMINI_MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
            response_mime_type: defaults.response_mime_type,
        };

        let gemini = GeminiConfig {
            api_key: get("GEMINI_API_KEY"),
            api_base: get("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            generation,
        };

        let timeout_secs = parse_or(
            &get,
            "CITY_EXPLORER_LOCATION_TIMEOUT_SECS",
            DEFAULT_LOCATION_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(eyre!("CITY_EXPLORER_LOCATION_TIMEOUT_SECS must be greater than zero"));
        }

        let location = LocationConfig {
            position_url: get("CITY_EXPLORER_POSITION_URL")
                .unwrap_or_else(|| DEFAULT_POSITION_URL.to_string()),
            geocoder_url: get("CITY_EXPLORER_GEOCODER_URL")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self { gemini, location })
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid value for {}: {:?} ({})", key, raw, e)),
        None => Ok(default),
    }
}
