//! Bootstrap configuration
//!
//! Configuration is consumed once at bootstrap. Missing values are never
//! fatal; documented defaults substitute.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Placeholder used when a service does not announce its name.
pub const DEFAULT_SERVICE_NAME: &str = "unknown-service";

/// Default service version when none is configured.
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";

/// Capabilities a service can request at bootstrap.
///
/// Requested capabilities form a set: asking for the same capability twice
/// is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Tracing,
    Metrics,
    Logging,
    Health,
    ScrapeEndpoint,
}

impl Capability {
    /// Every capability, in composition order.
    pub fn all() -> [Capability; 5] {
        [
            Capability::Logging,
            Capability::Tracing,
            Capability::Metrics,
            Capability::Health,
            Capability::ScrapeEndpoint,
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub service_name: String,
    pub service_version: String,
    pub otlp_endpoint: Option<String>,
    pub log_level: String,
    pub json_logs: bool,
    /// Free-form resource attributes, insertion-ordered.
    pub attributes: Vec<(String, String)>,
    /// Budget for a single health probe evaluation.
    pub probe_timeout: Duration,
    /// Overall deadline for exporter drain at shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            json_logs: true,
            attributes: Vec::new(),
            probe_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| DEFAULT_SERVICE_VERSION.to_string()),
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            json_logs: env::var("JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            attributes: Vec::new(),
            probe_timeout: env_duration_ms("PROBE_TIMEOUT_MS", Duration::from_secs(5)),
            shutdown_timeout: env_duration_ms("SHUTDOWN_TIMEOUT_MS", Duration::from_secs(10)),
        }
    }

    /// Build from an explicit key/value mapping.
    ///
    /// Recognized keys: `ServiceName`, `ServiceVersion`, `OtlpEndpoint`.
    /// Every other key becomes a resource attribute.
    pub fn from_map(values: &BTreeMap<String, String>) -> Self {
        let mut config = Self::default();
        for (key, value) in values {
            match key.as_str() {
                "ServiceName" => config.service_name = value.clone(),
                "ServiceVersion" => config.service_version = value.clone(),
                "OtlpEndpoint" => config.otlp_endpoint = Some(value.clone()),
                _ => config.attributes.push((key.clone(), value.clone())),
            }
        }
        config
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

fn env_duration_ms(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_substitute_for_missing_values() {
        let config = BootstrapConfig::from_map(&BTreeMap::new());
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.service_version, DEFAULT_SERVICE_VERSION);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn recognized_keys_are_consumed() {
        let mut values = BTreeMap::new();
        values.insert("ServiceName".to_string(), "orders-api".to_string());
        values.insert("ServiceVersion".to_string(), "2.3.0".to_string());
        values.insert(
            "OtlpEndpoint".to_string(),
            "https://collector:4317".to_string(),
        );
        values.insert("deployment.region".to_string(), "eu-west-1".to_string());

        let config = BootstrapConfig::from_map(&values);
        assert_eq!(config.service_name, "orders-api");
        assert_eq!(config.service_version, "2.3.0");
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("https://collector:4317")
        );
        assert_eq!(
            config.attributes,
            vec![("deployment.region".to_string(), "eu-west-1".to_string())]
        );
    }
}
