use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cluster::Cluster;
use crate::error::{BindingError, BindingResult};
use crate::read_preference::ReadPreference;
use crate::selectors::ReadPreferenceServerSelector;
use crate::server::ServerRef;

/// Runs a fresh selection for every read; nothing is cached.
pub struct UnpinnedSelection {
    cluster: Arc<dyn Cluster>,
    selector: ReadPreferenceServerSelector,
    disposed: AtomicBool,
}

impl UnpinnedSelection {
    pub fn new(cluster: Arc<dyn Cluster>, read_preference: ReadPreference) -> Self {
        Self::with_selector(cluster, ReadPreferenceServerSelector::new(read_preference))
    }

    pub fn with_selector(cluster: Arc<dyn Cluster>, selector: ReadPreferenceServerSelector) -> Self {
        Self {
            cluster,
            selector,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn read_preference(&self) -> ReadPreference {
        self.selector.read_preference()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub async fn select_server(
        &self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> BindingResult<ServerRef> {
        if self.is_disposed() {
            return Err(BindingError::disposed::<Self>());
        }
        Ok(self
            .cluster
            .select_server(&self.selector, timeout, cancel)
            .await?)
    }
}
