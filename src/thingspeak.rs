use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;

use crate::error::{ForwarderError, Result, Stage};
use crate::record::OutputRecord;

#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    api_key: &'a str,
    field1: &'a str,
    field2: &'a str,
    field3: &'a str,
    field4: &'a str,
    field5: &'a str,
    field6: &'a str,
    field7: &'a str,
    field8: &'a str,
}

impl<'a> UpdatePayload<'a> {
    fn new(write_api_key: &'a str, record: &'a OutputRecord) -> Self {
        let [field1, field2, field3, field4, field5, field6, field7, field8] = record.slots();
        Self {
            api_key: write_api_key,
            field1,
            field2,
            field3,
            field4,
            field5,
            field6,
            field7,
            field8,
        }
    }
}

pub fn encode_update(write_api_key: &str, record: &OutputRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(&UpdatePayload::new(write_api_key, record))
        .map_err(ForwarderError::Serialization)
}

pub struct ThingSpeakClient {
    http: Client,
    url: String,
}

impl ThingSpeakClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Posts one channel update and hands back the response body as-is
    /// (ThingSpeak answers with the new entry id, or `0` when it rejects the write).
    pub async fn publish(&self, write_api_key: &str, record: &OutputRecord) -> Result<String> {
        let body = encode_update(write_api_key, record)?;

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| ForwarderError::network(Stage::Publish, err))?;

        response
            .text()
            .await
            .map_err(|err| ForwarderError::network(Stage::Publish, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JsonValue};

    #[test]
    fn payload_carries_key_and_all_eight_fields() {
        let record = OutputRecord {
            outdoor_temperature: "21.5".to_string(),
            outdoor_humidity: "55".to_string(),
            solar_irradiance: "412.7".to_string(),
            ..OutputRecord::default()
        };
        let encoded = encode_update("WRITEKEY", &record).unwrap();
        let value: JsonValue = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(
            value,
            json!({
                "api_key": "WRITEKEY",
                "field1": "21.5",
                "field2": "55",
                "field3": "",
                "field4": "",
                "field5": "",
                "field6": "",
                "field7": "",
                "field8": "412.7",
            })
        );
    }

    #[test]
    fn payload_keeps_field_order() {
        let encoded = encode_update("k", &OutputRecord::default()).unwrap();
        let text = String::from_utf8(encoded).unwrap();
        assert!(text.starts_with(r#"{"api_key":"k","field1":"#));
        assert!(text.ends_with(r#""field8":""}"#));
    }
}
