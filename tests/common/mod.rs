#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use read_binding::{
    Cluster, SelectionError, Server, ServerAddress, ServerDescription, ServerRef, ServerSelector,
    ServerType,
};
use tokio_util::sync::CancellationToken;

/// Cluster double that hands out a brand new server on every call.
///
/// Each call sleeps for `delay` (observing cancellation), then either fails
/// with a timeout while `failures` remain or returns `mock:<call number>`.
pub struct MockCluster {
    delay: Duration,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl MockCluster {
    pub fn new(delay: Duration) -> Arc<Self> {
        Self::failing_first(delay, 0)
    }

    pub fn failing_first(delay: Duration, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            delay,
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cluster for MockCluster {
    async fn select_server(
        &self,
        selector: &dyn ServerSelector,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<ServerRef, SelectionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SelectionError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {}
        }

        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(SelectionError::Timeout {
                timeout: timeout.unwrap_or_default(),
                selector: selector.describe(),
            });
        }

        Ok(Server::new_ref(ServerDescription::new(
            ServerAddress::new("mock", call as u16),
            ServerType::Secondary,
        )))
    }
}
