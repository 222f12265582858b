use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cluster::Cluster;
use crate::connection_source::ConnectionSource;
use crate::error::{BindingError, BindingResult};
use crate::read_preference::ReadPreference;
use crate::server::ServerRef;

use super::ReadBinding;

/// Teardown hook run when the last [`SharedHandle`] of a lineage is disposed.
pub trait Dispose {
    /// Name reported in [`BindingError::Disposed`] by handles over this value.
    const HANDLE_NAME: &'static str = "SharedHandle";

    fn dispose(&self);
}

struct Shared<T> {
    value: T,
    ref_count: AtomicUsize,
}

impl<T> Shared<T> {
    // Fails once the count has reached zero; a released value is never revived.
    fn acquire(&self) -> bool {
        let mut current = self.ref_count.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.ref_count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns true for the caller that took the count to zero.
    fn release(&self) -> bool {
        let mut current = self.ref_count.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.ref_count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current == 1,
                Err(actual) => current = actual,
            }
        }
    }
}

/// One checkout of a reference-counted value.
///
/// Forks are peers: each one holds a count on the shared value and can be
/// disposed independently, in any order. Disposing a handle twice is a no-op.
/// The value's [`Dispose::dispose`] runs exactly once, when the final handle
/// goes away. Dropping a handle disposes it.
pub struct SharedHandle<T: Dispose> {
    shared: Arc<Shared<T>>,
    disposed: AtomicBool,
}

impl<T: Dispose> SharedHandle<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value,
                ref_count: AtomicUsize::new(1),
            }),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn fork(&self) -> BindingResult<Self> {
        self.ensure_active()?;
        if !self.shared.acquire() {
            return Err(Self::disposed_error());
        }
        debug!(ref_count = self.ref_count(), "handle forked");
        Ok(Self {
            shared: Arc::clone(&self.shared),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.shared.release() {
            debug!("last handle disposed, releasing shared value");
            self.shared.value.dispose();
        } else {
            debug!(ref_count = self.ref_count(), "handle disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of live handles sharing the value.
    pub fn ref_count(&self) -> usize {
        self.shared.ref_count.load(Ordering::Acquire)
    }

    /// Whether two handles share the same value.
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn get(&self) -> BindingResult<&T> {
        self.ensure_active()?;
        Ok(&self.shared.value)
    }

    fn ensure_active(&self) -> BindingResult<()> {
        if self.is_disposed() {
            return Err(Self::disposed_error());
        }
        Ok(())
    }

    fn disposed_error() -> BindingError {
        BindingError::Disposed {
            type_name: T::HANDLE_NAME,
        }
    }
}

impl<T: Dispose> Drop for SharedHandle<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Dispose> fmt::Debug for SharedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandle")
            .field("ref_count", &self.ref_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A shareable read binding; see [`ReadBinding`] for the variants.
pub type ReadBindingHandle = SharedHandle<ReadBinding>;

impl SharedHandle<ReadBinding> {
    pub fn consistent_secondary(cluster: Arc<dyn Cluster>) -> Self {
        Self::new(ReadBinding::consistent_secondary(cluster))
    }

    pub fn pinned_primary(cluster: Arc<dyn Cluster>) -> Self {
        Self::new(ReadBinding::pinned_primary(cluster))
    }

    pub fn pinned(cluster: Arc<dyn Cluster>, read_preference: ReadPreference) -> Self {
        Self::new(ReadBinding::pinned(cluster, read_preference))
    }

    pub fn unpinned(cluster: Arc<dyn Cluster>, read_preference: ReadPreference) -> Self {
        Self::new(ReadBinding::unpinned(cluster, read_preference))
    }

    pub fn read_preference(&self) -> ReadPreference {
        self.shared.value.read_preference()
    }

    pub fn pinned_server(&self) -> Option<ServerRef> {
        self.shared.value.pinned_server()
    }

    /// Resolves the server for the next read through this handle.
    ///
    /// A disposed handle fails with [`BindingError::Disposed`] before the
    /// cluster is consulted, even while sibling forks are still live.
    pub async fn read_connection_source(
        &self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> BindingResult<ConnectionSource> {
        self.ensure_active()?;
        self.shared
            .value
            .read_connection_source(timeout, cancel)
            .await
    }
}
