//! Read bindings: how a logical sequence of reads chooses its server.
//!
//! A [`ReadBinding`] is either pinned, where the first selected server serves
//! every later read, or unpinned, where each read selects anew. Bindings are
//! shared through [`ReadBindingHandle`], which forks cheaply and tears the
//! binding down once the last handle is disposed.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cluster::Cluster;
use crate::connection_source::ConnectionSource;
use crate::error::BindingResult;
use crate::read_preference::ReadPreference;
use crate::selectors::ReadPreferenceServerSelector;
use crate::server::ServerRef;

pub mod handle;
pub mod selection_cache;
pub mod unpinned;

pub use handle::{Dispose, ReadBindingHandle, SharedHandle};
pub use selection_cache::SelectionCache;
pub use unpinned::UnpinnedSelection;

pub enum ReadBinding {
    Pinned(SelectionCache),
    Unpinned(UnpinnedSelection),
}

impl ReadBinding {
    /// Pins reads to the first server matching `read_preference`.
    pub fn pinned(cluster: Arc<dyn Cluster>, read_preference: ReadPreference) -> Self {
        ReadBinding::Pinned(SelectionCache::new(cluster, read_preference))
    }

    pub fn pinned_with_selector(
        cluster: Arc<dyn Cluster>,
        selector: ReadPreferenceServerSelector,
    ) -> Self {
        ReadBinding::Pinned(SelectionCache::with_selector(cluster, selector))
    }

    pub fn consistent_secondary(cluster: Arc<dyn Cluster>) -> Self {
        Self::pinned(cluster, ReadPreference::Secondary)
    }

    pub fn pinned_primary(cluster: Arc<dyn Cluster>) -> Self {
        Self::pinned(cluster, ReadPreference::Primary)
    }

    pub fn unpinned(cluster: Arc<dyn Cluster>, read_preference: ReadPreference) -> Self {
        ReadBinding::Unpinned(UnpinnedSelection::new(cluster, read_preference))
    }

    pub fn read_preference(&self) -> ReadPreference {
        match self {
            ReadBinding::Pinned(cache) => cache.read_preference(),
            ReadBinding::Unpinned(selection) => selection.read_preference(),
        }
    }

    pub fn is_pinning(&self) -> bool {
        matches!(self, ReadBinding::Pinned(_))
    }

    /// Server reads are pinned to so far. Always `None` for unpinned bindings.
    pub fn pinned_server(&self) -> Option<ServerRef> {
        match self {
            ReadBinding::Pinned(cache) => cache.pinned_server(),
            ReadBinding::Unpinned(_) => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        match self {
            ReadBinding::Pinned(cache) => cache.is_disposed(),
            ReadBinding::Unpinned(selection) => selection.is_disposed(),
        }
    }

    pub async fn read_connection_source(
        &self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> BindingResult<ConnectionSource> {
        let server = match self {
            ReadBinding::Pinned(cache) => cache.resolve_server(timeout, cancel).await?,
            ReadBinding::Unpinned(selection) => selection.select_server(timeout, cancel).await?,
        };
        Ok(ConnectionSource::new(server))
    }
}

impl Dispose for ReadBinding {
    const HANDLE_NAME: &'static str = "ReadBindingHandle";

    fn dispose(&self) {
        match self {
            ReadBinding::Pinned(cache) => cache.dispose(),
            ReadBinding::Unpinned(selection) => selection.dispose(),
        }
    }
}
