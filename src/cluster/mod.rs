use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SelectionError;
use crate::selectors::ServerSelector;
use crate::server::ServerRef;

pub mod static_cluster;

pub use static_cluster::StaticCluster;

/// A view of the deployment that can hand out a member matching a selector.
///
/// `select_server` may suspend until a matching member appears. It gives up
/// with [`SelectionError::Timeout`] once `timeout` elapses (`None` waits
/// indefinitely) and with [`SelectionError::Cancelled`] as soon as `cancel`
/// fires.
#[async_trait]
pub trait Cluster: Send + Sync {
    async fn select_server(
        &self,
        selector: &dyn ServerSelector,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<ServerRef, SelectionError>;
}
