//! Normalizer configuration.
//!
//! # Design
//! Settings that hold for every request a normalizer handles. The struct
//! deserializes with serde so embedding applications can load it from their
//! own configuration files; missing fields fall back to `Default`, unknown
//! fields are rejected.

use serde::{Deserialize, Serialize};

use crate::encoding::brotli_supported;

pub const DEFAULT_USER_AGENT: &str = concat!("outbound/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_ACCEPT: &str = "*/*";

/// What to do when the size of a stream body cannot be determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailurePolicy {
    /// Fail `finalize` with `NormalizeError::BodyInspection`.
    #[default]
    Error,
    /// Send the stream without `content-length`.
    Chunked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Default `user-agent`; `None` sends none unless the caller sets one.
    pub user_agent: Option<String>,
    /// Default `accept`.
    pub accept: Option<String>,
    /// Whether `br` may be advertised in `accept-encoding`.
    pub brotli: bool,
    pub probe_failure: ProbeFailurePolicy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            accept: Some(DEFAULT_ACCEPT.to_string()),
            brotli: brotli_supported(),
            probe_failure: ProbeFailurePolicy::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_use_defaults() {
        let config: NormalizerConfig = serde_json::from_value(json!({"brotli": false})).unwrap();
        assert_eq!(config.user_agent.as_deref(), Some(DEFAULT_USER_AGENT));
        assert_eq!(config.accept.as_deref(), Some("*/*"));
        assert!(!config.brotli);
        assert_eq!(config.probe_failure, ProbeFailurePolicy::Error);
    }

    #[test]
    fn policy_and_null_defaults_parse() {
        let config: NormalizerConfig = serde_json::from_value(json!({
            "user_agent": null,
            "probe_failure": "chunked"
        }))
        .unwrap();
        assert_eq!(config.user_agent, None);
        assert_eq!(config.probe_failure, ProbeFailurePolicy::Chunked);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<NormalizerConfig, _> = serde_json::from_value(json!({"retries": 2}));
        assert!(result.is_err());
    }
}
