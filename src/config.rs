use crate::error::{ForwarderError, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENV_FILE: &str = "ecowitt_to_thingspeak.env";
pub const DEFAULT_ECOWITT_API_URL: &str = "https://api.ecowitt.net/api/v3/device/real_time";
pub const DEFAULT_THINGSPEAK_API_URL: &str = "https://api.thingspeak.com/update";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const KEY_APPLICATION_KEY: &str = "ECOWITT_APPLICATION_KEY";
const KEY_API_KEY: &str = "ECOWITT_API_KEY";
const KEY_MAC: &str = "ECOWITT_MAC";
const KEY_WRITE_API_KEY: &str = "THINGSPEAK_WRITE_API_KEY";

/// Secrets for both remote services. Read once at startup, never mutated.
#[derive(Clone)]
pub struct Credentials {
    pub application_key: String,
    pub api_key: String,
    pub mac: String,
    pub write_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("application_key", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("mac", &self.mac)
            .field("write_api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub ecowitt_url: String,
    pub thingspeak_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ecowitt_url: DEFAULT_ECOWITT_API_URL.to_string(),
            thingspeak_url: DEFAULT_THINGSPEAK_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };
        let credentials = Credentials {
            application_key: required(KEY_APPLICATION_KEY),
            api_key: required(KEY_API_KEY),
            mac: required(KEY_MAC),
            write_api_key: required(KEY_WRITE_API_KEY),
        };
        if !missing.is_empty() {
            return Err(ForwarderError::ConfigMissing { keys: missing });
        }

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            ecowitt_url: get("ECOWITT_API_URL").unwrap_or(defaults.ecowitt_url),
            thingspeak_url: get("THINGSPEAK_API_URL").unwrap_or(defaults.thingspeak_url),
        };

        let poll_interval = Duration::from_secs(env_secs(
            "FORWARDER_POLL_INTERVAL_SECS",
            get("FORWARDER_POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let request_timeout = Duration::from_secs(env_secs(
            "FORWARDER_REQUEST_TIMEOUT_SECS",
            get("FORWARDER_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);

        Ok(Self {
            credentials,
            endpoints,
            poll_interval,
            request_timeout,
        })
    }
}

fn env_secs(key: &'static str, raw: Option<String>, default: u64) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .parse::<u64>()
        .map_err(|err| ForwarderError::ConfigInvalid {
            key,
            reason: err.to_string(),
        })?;
    if value == 0 {
        return Err(ForwarderError::ConfigInvalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

pub fn env_file_path() -> PathBuf {
    env::var("FORWARDER_ENV_FILE")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
}

/// Loads the env file into the process environment. Existing variables win.
pub fn load_env_file() -> std::result::Result<PathBuf, (PathBuf, dotenvy::Error)> {
    let path = env_file_path();
    match dotenvy::from_path(&path) {
        Ok(()) => Ok(path),
        Err(err) => Err((path, err)),
    }
}
