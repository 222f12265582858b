use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::error::{BindingError, BindingResult};
use crate::read_preference::ReadPreference;
use crate::selectors::{ReadPreferenceServerSelector, ServerSelector};
use crate::server::ServerRef;

/// Lazily selects one server for a read preference and keeps returning it.
///
/// The first successful selection is pinned for the lifetime of the cache.
/// Concurrent first callers each run their own selection with no lock held;
/// whoever stores first wins and every other racer adopts that server, so all
/// callers observe one value even though the cluster may be asked more than
/// once.
pub struct SelectionCache {
    cluster: Arc<dyn Cluster>,
    selector: ReadPreferenceServerSelector,
    pinned: RwLock<Option<ServerRef>>,
    disposed: AtomicBool,
}

impl SelectionCache {
    pub fn new(cluster: Arc<dyn Cluster>, read_preference: ReadPreference) -> Self {
        Self::with_selector(cluster, ReadPreferenceServerSelector::new(read_preference))
    }

    pub fn with_selector(cluster: Arc<dyn Cluster>, selector: ReadPreferenceServerSelector) -> Self {
        Self {
            cluster,
            selector,
            pinned: RwLock::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn read_preference(&self) -> ReadPreference {
        self.selector.read_preference()
    }

    /// The pinned server, if a selection has already succeeded. Never suspends.
    pub fn pinned_server(&self) -> Option<ServerRef> {
        self.pinned.read().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Marks the cache disposed. The pinned server is not owned here and is left untouched.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            debug!(read_preference = %self.read_preference(), "selection cache disposed");
        }
    }

    pub async fn resolve_server(
        &self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> BindingResult<ServerRef> {
        if self.is_disposed() {
            return Err(BindingError::disposed::<Self>());
        }

        let cached = self.pinned_server();
        if let Some(server) = cached {
            return Ok(server);
        }

        debug!(selector = %self.selector.describe(), "selecting server to pin");
        let selected = self
            .cluster
            .select_server(&self.selector, timeout, cancel)
            .await?;

        let mut pinned = self.pinned.write();
        match pinned.as_ref() {
            Some(winner) => {
                debug!(
                    server.address = %winner.address(),
                    discarded = %selected.address(),
                    "lost pinning race, adopting existing server"
                );
                Ok(Arc::clone(winner))
            }
            None => {
                info!(
                    server.address = %selected.address(),
                    read_preference = %self.read_preference(),
                    "pinned server for reads"
                );
                *pinned = Some(Arc::clone(&selected));
                Ok(selected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::cluster::StaticCluster;
    use crate::error::SelectionError;
    use crate::server::{ServerAddress, ServerDescription, ServerType};

    struct CountingCluster {
        inner: StaticCluster,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Cluster for CountingCluster {
        async fn select_server(
            &self,
            selector: &dyn ServerSelector,
            timeout: Option<Duration>,
            cancel: &CancellationToken,
        ) -> Result<ServerRef, SelectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.select_server(selector, timeout, cancel).await
        }
    }

    fn secondaries(count: u16) -> Arc<CountingCluster> {
        let members = (1..=count).map(|port| {
            ServerDescription::new(ServerAddress::new("db", port), ServerType::Secondary)
        });
        Arc::new(CountingCluster {
            inner: StaticCluster::new(members),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn pins_first_selection_and_skips_cluster_afterwards() {
        let cluster = secondaries(5);
        let cache = SelectionCache::new(cluster.clone(), ReadPreference::Secondary);
        let cancel = CancellationToken::new();

        assert!(cache.pinned_server().is_none());
        let first = cache.resolve_server(None, &cancel).await.unwrap();
        for _ in 0..50 {
            let again = cache.resolve_server(None, &cancel).await.unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }

        assert_eq!(cluster.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&cache.pinned_server().unwrap(), &first));
    }

    #[tokio::test]
    async fn disposed_cache_refuses_without_selecting() {
        let cluster = secondaries(1);
        let cache = SelectionCache::new(cluster.clone(), ReadPreference::Secondary);
        cache.dispose();
        cache.dispose();

        let err = cache.resolve_server(None, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, BindingError::Disposed { type_name: "SelectionCache" });
        assert_eq!(cluster.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_selection_leaves_cache_empty() {
        let cluster = Arc::new(CountingCluster {
            inner: StaticCluster::new([ServerDescription::new(
                ServerAddress::new("db", 1),
                ServerType::Primary,
            )]),
            calls: AtomicUsize::new(0),
        });
        let cache = SelectionCache::new(cluster.clone(), ReadPreference::Secondary);

        let err = cache
            .resolve_server(Some(Duration::from_millis(5)), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BindingError::Selection(SelectionError::Timeout { .. })));
        assert!(cache.pinned_server().is_none());

        cluster.inner.set_servers([ServerDescription::new(
            ServerAddress::new("db", 2),
            ServerType::Secondary,
        )]);
        let server = cache.resolve_server(None, &CancellationToken::new()).await.unwrap();
        assert_eq!(server.address().port, 2);
        assert_eq!(cluster.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pinned_server_survives_membership_change() {
        let cluster = secondaries(3);
        let cache = SelectionCache::new(cluster.clone(), ReadPreference::Secondary);
        let cancel = CancellationToken::new();

        let first = cache.resolve_server(None, &cancel).await.unwrap();
        cluster.inner.set_servers([ServerDescription::new(
            ServerAddress::new("other", 9),
            ServerType::Secondary,
        )]);
        let again = cache.resolve_server(None, &cancel).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
}
