use std::time::Duration;

use thiserror::Error;

/// Failures reported by a [`Cluster`](crate::cluster::Cluster) while selecting a server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no server matching {selector} found within {timeout:?}")]
    Timeout { timeout: Duration, selector: String },

    #[error("server selection was cancelled")]
    Cancelled,
}

/// Errors surfaced by bindings and their handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("{type_name} has been disposed")]
    Disposed { type_name: &'static str },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl BindingError {
    pub(crate) fn disposed<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let type_name = base.rsplit("::").next().unwrap_or(base);
        BindingError::Disposed { type_name }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, BindingError::Disposed { .. })
    }
}

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown read preference: {0:?}")]
    InvalidReadPreference(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid server entry: {0:?}")]
    InvalidServer(String),

    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}
