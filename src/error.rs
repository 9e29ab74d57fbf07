use std::fmt;
use thiserror::Error;

/// Which remote call a network failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => f.write_str("ecowitt fetch"),
            Stage::Publish => f.write_str("thingspeak publish"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("missing required configuration: {}", keys.join(", "))]
    ConfigMissing { keys: Vec<&'static str> },

    #[error("invalid {key}: {reason}")]
    ConfigInvalid { key: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("{stage} request failed: {source}")]
    Network {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode Ecowitt response: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Ecowitt API returned code {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("failed to encode ThingSpeak payload: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ForwarderError {
    pub fn network(stage: Stage, source: reqwest::Error) -> Self {
        Self::Network { stage, source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { source, .. } if source.is_timeout())
    }
}

pub type Result<T, E = ForwarderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_lists_every_key() {
        let err = ForwarderError::ConfigMissing {
            keys: vec!["ECOWITT_MAC", "THINGSPEAK_WRITE_API_KEY"],
        };
        assert_eq!(
            err.to_string(),
            "missing required configuration: ECOWITT_MAC, THINGSPEAK_WRITE_API_KEY"
        );
    }

    #[test]
    fn provider_error_carries_code_and_message() {
        let err = ForwarderError::Provider {
            code: 40010,
            message: "Illegal Application_Key Parameter".to_string(),
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("40010"));
        assert!(err.to_string().contains("Illegal Application_Key"));
    }

    #[test]
    fn stage_names_the_remote_service() {
        assert_eq!(Stage::Fetch.to_string(), "ecowitt fetch");
        assert_eq!(Stage::Publish.to_string(), "thingspeak publish");
    }
}
