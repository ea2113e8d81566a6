//! Environment-driven configuration.
//!
//! Loaded with figment from raw environment variables, so `PORT` maps to
//! `port`, `FETCH_TIMEOUT` to `fetch_timeout`, and so on.

use figment::{Figment, providers::Env};
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::scrape::{FallbackSearch, ScrapeSettings, fallback};

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listen port. Unset and empty both fall back to [`DEFAULT_PORT`].
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub fetch_timeout: Duration,
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
    #[serde(default = "default_max_visits")]
    pub max_visits: usize,
    #[serde(default = "default_rmp_search_url")]
    pub rmp_search_url: String,
    #[serde(default = "default_school_city")]
    pub school_city: String,
    #[serde(default = "default_fallback_search_url")]
    pub fallback_search_url: String,
    #[serde(default = "default_fallback_qualifier")]
    pub fallback_qualifier: String,
    #[serde(default = "default_fallback_origin")]
    pub fallback_origin: String,
    #[serde(default = "default_fallback_link_marker")]
    pub fallback_link_marker: String,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, figment::Error> {
        Self::from_figment(Figment::new().merge(Env::raw()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    pub fn listen_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn scrape_settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            search_url: self.rmp_search_url.clone(),
            school_city: self.school_city.clone(),
            max_visits: self.max_visits,
        }
    }

    pub fn fallback_search(&self) -> FallbackSearch {
        FallbackSearch {
            search_url: self.fallback_search_url.clone(),
            qualifier: self.fallback_qualifier.clone(),
            origin: self.fallback_origin.clone(),
            link_marker: self.fallback_link_marker.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_visits() -> usize {
    crate::scrape::DEFAULT_MAX_VISITS
}

fn default_rmp_search_url() -> String {
    crate::scrape::DEFAULT_SEARCH_URL.to_owned()
}

fn default_school_city() -> String {
    crate::scrape::DEFAULT_SCHOOL_CITY.to_owned()
}

fn default_fallback_search_url() -> String {
    fallback::DEFAULT_SEARCH_URL.to_owned()
}

fn default_fallback_qualifier() -> String {
    fallback::DEFAULT_QUALIFIER.to_owned()
}

fn default_fallback_origin() -> String {
    fallback::DEFAULT_ORIGIN.to_owned()
}

fn default_fallback_link_marker() -> String {
    fallback::DEFAULT_LINK_MARKER.to_owned()
}

/// Env values arrive either as numbers or as strings (including `""`).
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = match Option::<NumberOrString>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrString::Number(n)) => n.to_string(),
        Some(NumberOrString::String(s)) => s,
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u16>()
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid port {raw:?}: {e}")))
}

/// Accepts `"30s"`, `"2m"`, `"1.5h"` or a bare number of seconds.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(secs) => return Ok(Duration::from_secs(secs)),
        NumberOrString::String(s) => s,
    };
    let parsed = DurationParser::with_all_time_units()
        .parse(raw.trim())
        .map_err(|e| D::Error::custom(format!("invalid duration {raw:?}: {e}")))?;
    Duration::try_from(parsed).map_err(|e| D::Error::custom(format!("invalid duration {raw:?}: {e}")))
}
