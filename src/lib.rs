pub mod binding;
pub mod cluster;
pub mod config;
pub mod connection_source;
pub mod error;
pub mod read_preference;
pub mod selectors;
pub mod server;

pub use binding::{Dispose, ReadBinding, ReadBindingHandle, SelectionCache, SharedHandle};
pub use cluster::{Cluster, StaticCluster};
pub use config::BindingConfig;
pub use connection_source::ConnectionSource;
pub use error::{BindingError, BindingResult, ConfigError, SelectionError};
pub use read_preference::ReadPreference;
pub use selectors::{ReadPreferenceServerSelector, ServerSelector};
pub use server::{Server, ServerAddress, ServerDescription, ServerRef, ServerType};
