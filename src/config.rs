use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::read_preference::ReadPreference;
use crate::selectors::read_preference::DEFAULT_LOCAL_THRESHOLD;
use crate::selectors::ReadPreferenceServerSelector;
use crate::server::ServerDescription;

const DEFAULT_READERS: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingConfig {
    #[serde(default)]
    pub servers: Vec<ServerDescription>,
    #[serde(default = "default_read_preference")]
    pub read_preference: ReadPreference,
    #[serde(default)]
    pub server_selection_timeout_ms: Option<u64>,
    #[serde(default = "default_local_threshold_ms")]
    pub local_threshold_ms: u64,
    #[serde(default = "default_readers")]
    pub readers: usize,
}

fn default_read_preference() -> ReadPreference {
    ReadPreference::Secondary
}

fn default_local_threshold_ms() -> u64 {
    DEFAULT_LOCAL_THRESHOLD.as_millis() as u64
}

fn default_readers() -> usize {
    DEFAULT_READERS
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            read_preference: default_read_preference(),
            server_selection_timeout_ms: None,
            local_threshold_ms: default_local_threshold_ms(),
            readers: default_readers(),
        }
    }
}

impl BindingConfig {
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Reads `READ_BINDING_*` variables; anything unset keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(servers) = lookup("READ_BINDING_SERVERS") {
            config.servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<ServerDescription>)
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(pref) = lookup("READ_BINDING_READ_PREFERENCE") {
            config.read_preference = pref.parse::<ReadPreference>()?;
        }
        if let Some(ms) = lookup("READ_BINDING_SELECTION_TIMEOUT_MS") {
            config.server_selection_timeout_ms =
                Some(parse_number("READ_BINDING_SELECTION_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("READ_BINDING_LOCAL_THRESHOLD_MS") {
            config.local_threshold_ms = parse_number("READ_BINDING_LOCAL_THRESHOLD_MS", &ms)?;
        }
        if let Some(readers) = lookup("READ_BINDING_READERS") {
            config.readers = parse_number("READ_BINDING_READERS", &readers)?;
        }

        Ok(config)
    }

    pub fn server_selection_timeout(&self) -> Option<Duration> {
        self.server_selection_timeout_ms.map(Duration::from_millis)
    }

    pub fn selector(&self) -> ReadPreferenceServerSelector {
        ReadPreferenceServerSelector::new(self.read_preference)
            .with_local_threshold(Duration::from_millis(self.local_threshold_ms))
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
