use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

static NEXT_SERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Server`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(u64);

impl ServerId {
    fn next() -> Self {
        Self(NEXT_SERVER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidServer(s.to_string()))?;
        if host.is_empty() {
            return Err(ConfigError::InvalidServer(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidServer(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// Role a member currently plays in the replica set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerType {
    Primary,
    Secondary,
    Arbiter,
    Unknown,
}

impl ServerType {
    /// Whether the member holds data and may serve reads.
    pub fn is_data_bearing(&self) -> bool {
        matches!(self, ServerType::Primary | ServerType::Secondary)
    }
}

impl FromStr for ServerType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(ServerType::Primary),
            "secondary" => Ok(ServerType::Secondary),
            "arbiter" => Ok(ServerType::Arbiter),
            "unknown" => Ok(ServerType::Unknown),
            _ => Err(ConfigError::InvalidServer(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescription {
    pub address: ServerAddress,
    pub server_type: ServerType,
    #[serde(default)]
    pub round_trip_time: Duration,
}

impl ServerDescription {
    pub fn new(address: ServerAddress, server_type: ServerType) -> Self {
        Self {
            address,
            server_type,
            round_trip_time: Duration::ZERO,
        }
    }

    pub fn with_round_trip_time(mut self, round_trip_time: Duration) -> Self {
        self.round_trip_time = round_trip_time;
        self
    }
}

impl FromStr for ServerDescription {
    type Err = ConfigError;

    /// Parses `host:port` or `host:port=type`; the type defaults to secondary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, server_type) = match s.split_once('=') {
            Some((address, kind)) => (address, kind.parse::<ServerType>()?),
            None => (s, ServerType::Secondary),
        };
        Ok(Self::new(address.parse::<ServerAddress>()?, server_type))
    }
}

/// A cluster member as handed out by server selection.
///
/// Each `Server` value gets its own [`ServerId`], so two servers built from the
/// same description are still distinguishable.
#[derive(Debug)]
pub struct Server {
    id: ServerId,
    description: ServerDescription,
}

pub type ServerRef = Arc<Server>;

impl Server {
    pub fn new(description: ServerDescription) -> Self {
        Self {
            id: ServerId::next(),
            description,
        }
    }

    pub fn new_ref(description: ServerDescription) -> ServerRef {
        Arc::new(Self::new(description))
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn address(&self) -> &ServerAddress {
        &self.description.address
    }

    pub fn server_type(&self) -> ServerType {
        self.description.server_type
    }

    pub fn round_trip_time(&self) -> Duration {
        self.description.round_trip_time
    }

    pub fn description(&self) -> &ServerDescription {
        &self.description
    }
}
