//! Ecowitt cloud "real_time" device endpoint.
//!
//! Every level of the response is optional: a group or measurement the
//! station does not report decodes to empty text rather than failing.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::config::Credentials;
use crate::error::{ForwarderError, Result, Stage};

// Unit selectors are part of the relay's output contract: Celsius, hPa, m/s,
// mm, W/m².
const TEMP_UNIT_ID: &str = "1";
const PRESSURE_UNIT_ID: &str = "5";
const WIND_SPEED_UNIT_ID: &str = "7";
const RAINFALL_UNIT_ID: &str = "12";
const SOLAR_IRRADIANCE_UNIT_ID: &str = "16";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Reading {
    pub code: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(deserialize_with = "object_or_empty_list")]
    pub data: ReadingData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadingData {
    #[serde(deserialize_with = "null_as_default")]
    pub outdoor: Climate,
    #[serde(deserialize_with = "null_as_default")]
    pub indoor: Climate,
    #[serde(deserialize_with = "null_as_default")]
    pub wind: Wind,
    #[serde(deserialize_with = "null_as_default")]
    pub rainfall: Rainfall,
    #[serde(deserialize_with = "null_as_default")]
    pub pressure: Pressure,
    #[serde(deserialize_with = "null_as_default")]
    pub solar_and_uvi: SolarAndUvi,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Climate {
    #[serde(deserialize_with = "null_as_default")]
    pub temperature: Measurement,
    #[serde(deserialize_with = "null_as_default")]
    pub humidity: Measurement,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Wind {
    #[serde(deserialize_with = "null_as_default")]
    pub wind_speed: Measurement,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Rainfall {
    #[serde(deserialize_with = "null_as_default")]
    pub daily: Measurement,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pressure {
    #[serde(deserialize_with = "null_as_default")]
    pub relative: Measurement,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SolarAndUvi {
    #[serde(deserialize_with = "null_as_default")]
    pub solar: Measurement,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Measurement {
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
}

/// `null` is treated like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Error envelopes carry `"data": []` instead of an object.
fn object_or_empty_list<'de, D>(deserializer: D) -> Result<ReadingData, D::Error>
where
    D: Deserializer<'de>,
{
    let unexpected = match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => return Ok(ReadingData::default()),
        JsonValue::Array(items) if items.is_empty() => return Ok(ReadingData::default()),
        value @ JsonValue::Object(_) => {
            return ReadingData::deserialize(value).map_err(D::Error::custom);
        }
        JsonValue::Array(_) => Unexpected::Seq.to_string(),
        JsonValue::String(raw) => Unexpected::Str(&raw).to_string(),
        JsonValue::Bool(raw) => Unexpected::Bool(raw).to_string(),
        JsonValue::Number(_) => Unexpected::Other("number").to_string(),
    };
    Err(D::Error::custom(format_args!(
        "invalid type: {unexpected}, expected {EXPECTED_DATA}"
    )))
}

const EXPECTED_DATA: &str = "an object or an empty list";

impl Reading {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(ForwarderError::Parse)
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Turns a non-zero provider status into [`ForwarderError::Provider`].
    pub fn into_checked(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ForwarderError::Provider {
                code: self.code,
                message: self.msg,
            })
        }
    }

    /// Server timestamp, sent as unix seconds in text form.
    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        let secs = self.time.trim().parse::<i64>().ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

pub struct EcowittClient {
    http: Client,
    url: String,
}

impl EcowittClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// One authenticated read of the device's current data.
    ///
    /// The HTTP status is not inspected; callers decide success from
    /// [`Reading::code`].
    pub async fn fetch(&self, credentials: &Credentials) -> Result<Reading> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("application_key", credentials.application_key.as_str()),
                ("api_key", credentials.api_key.as_str()),
                ("mac", credentials.mac.as_str()),
                ("call_back", "all"),
                ("temp_unitid", TEMP_UNIT_ID),
                ("pressure_unitid", PRESSURE_UNIT_ID),
                ("wind_speed_unitid", WIND_SPEED_UNIT_ID),
                ("rainfall_unitid", RAINFALL_UNIT_ID),
                ("solar_irradiance_unitid", SOLAR_IRRADIANCE_UNIT_ID),
            ])
            .send()
            .await
            .map_err(|err| ForwarderError::network(Stage::Fetch, err))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| ForwarderError::network(Stage::Fetch, err))?;

        Reading::from_slice(&body)
    }
}
