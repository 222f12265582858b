use std::time::Duration;

use crate::read_preference::ReadPreference;
use crate::server::{ServerRef, ServerType};

use super::selector::ServerSelector;

pub const DEFAULT_LOCAL_THRESHOLD: Duration = Duration::from_millis(15);

/// Selects members by replica set role according to a [`ReadPreference`].
#[derive(Debug, Clone)]
pub struct ReadPreferenceServerSelector {
    read_preference: ReadPreference,
    local_threshold: Duration,
}

impl ReadPreferenceServerSelector {
    pub fn new(read_preference: ReadPreference) -> Self {
        Self {
            read_preference,
            local_threshold: DEFAULT_LOCAL_THRESHOLD,
        }
    }

    /// Latency window used by [`ReadPreference::Nearest`].
    pub fn with_local_threshold(mut self, local_threshold: Duration) -> Self {
        self.local_threshold = local_threshold;
        self
    }

    pub fn read_preference(&self) -> ReadPreference {
        self.read_preference
    }

    fn of_type(servers: &[ServerRef], server_type: ServerType) -> Vec<ServerRef> {
        servers
            .iter()
            .filter(|s| s.server_type() == server_type)
            .cloned()
            .collect()
    }

    fn nearest(&self, servers: &[ServerRef]) -> Vec<ServerRef> {
        let eligible: Vec<&ServerRef> = servers
            .iter()
            .filter(|s| s.server_type().is_data_bearing())
            .collect();

        let fastest = match eligible.iter().map(|s| s.round_trip_time()).min() {
            Some(rtt) => rtt,
            None => return Vec::new(),
        };
        let cutoff = fastest.saturating_add(self.local_threshold);

        eligible
            .into_iter()
            .filter(|s| s.round_trip_time() <= cutoff)
            .cloned()
            .collect()
    }
}

impl ServerSelector for ReadPreferenceServerSelector {
    fn select(&self, servers: &[ServerRef]) -> Vec<ServerRef> {
        match self.read_preference {
            ReadPreference::Primary => Self::of_type(servers, ServerType::Primary),
            ReadPreference::Secondary => Self::of_type(servers, ServerType::Secondary),
            ReadPreference::PrimaryPreferred => {
                let primaries = Self::of_type(servers, ServerType::Primary);
                if primaries.is_empty() {
                    Self::of_type(servers, ServerType::Secondary)
                } else {
                    primaries
                }
            }
            ReadPreference::SecondaryPreferred => {
                let secondaries = Self::of_type(servers, ServerType::Secondary);
                if secondaries.is_empty() {
                    Self::of_type(servers, ServerType::Primary)
                } else {
                    secondaries
                }
            }
            ReadPreference::Nearest => self.nearest(servers),
        }
    }

    fn describe(&self) -> String {
        format!("read preference {}", self.read_preference)
    }
}
