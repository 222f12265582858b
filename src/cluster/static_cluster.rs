use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::Rng;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::SelectionError;
use crate::selectors::ServerSelector;
use crate::server::{Server, ServerDescription, ServerRef};

use super::Cluster;

/// A cluster whose membership is supplied by the caller instead of discovered.
///
/// Selection picks uniformly among the members the selector accepts. When
/// none qualify, callers wait for the next [`StaticCluster::set_servers`].
pub struct StaticCluster {
    servers: RwLock<Vec<ServerRef>>,
    changed: Notify,
}

impl StaticCluster {
    pub fn new(descriptions: impl IntoIterator<Item = ServerDescription>) -> Self {
        Self::from_servers(descriptions.into_iter().map(Server::new_ref).collect())
    }

    pub fn from_servers(servers: Vec<ServerRef>) -> Self {
        Self {
            servers: RwLock::new(servers),
            changed: Notify::new(),
        }
    }

    pub fn servers(&self) -> Vec<ServerRef> {
        self.servers.read().clone()
    }

    /// Replace the membership and wake any selection waiting for a match.
    pub fn set_servers(&self, descriptions: impl IntoIterator<Item = ServerDescription>) {
        let servers: Vec<ServerRef> = descriptions.into_iter().map(Server::new_ref).collect();
        debug!(members = servers.len(), "cluster membership replaced");
        {
            let mut guard = self.servers.write();
            *guard = servers;
        }
        self.changed.notify_waiters();
    }
}

fn pick_random(candidates: &[ServerRef]) -> Option<ServerRef> {
    if candidates.is_empty() {
        return None;
    }
    let mut rng = rand::thread_rng();
    let idx = rng.gen_range(0..candidates.len());
    Some(candidates[idx].clone())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[async_trait]
impl Cluster for StaticCluster {
    async fn select_server(
        &self,
        selector: &dyn ServerSelector,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<ServerRef, SelectionError> {
        // A deadline past the clock's range behaves like no deadline at all.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            if cancel.is_cancelled() {
                return Err(SelectionError::Cancelled);
            }

            // Register before taking the snapshot so a concurrent set_servers is not missed.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let candidates = selector.select(&self.servers());
            if let Some(server) = pick_random(&candidates) {
                trace!(
                    server.address = %server.address(),
                    candidates = candidates.len(),
                    "server selected"
                );
                return Ok(server);
            }

            debug!(selector = %selector.describe(), "no matching member, waiting for topology change");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SelectionError::Cancelled),
                _ = wait_until(deadline) => {
                    return Err(SelectionError::Timeout {
                        timeout: timeout.unwrap_or_default(),
                        selector: selector.describe(),
                    });
                }
                _ = &mut notified => {}
            }
        }
    }
}
