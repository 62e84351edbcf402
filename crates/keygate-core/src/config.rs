//! Process-level configuration for KeyGate.
//!
//! All configuration is driven by environment variables.

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Text`] for anything unknown.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Global configuration for the KeyGate server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyGateConfig {
    /// Bind address for the gateway.
    pub gateway_listen: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Optional JSON fixture file seeding the in-memory stores.
    pub fixtures: Option<String>,
}

impl Default for KeyGateConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            log_format: LogFormat::Text,
            fixtures: None,
        }
    }
}

impl KeyGateConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = LogFormat::parse(&v);
        }
        if let Some(v) = lookup("KEYGATE_FIXTURES").filter(|v| !v.trim().is_empty()) {
            config.fixtures = Some(v);
        }

        config
    }
}
