use std::sync::Arc;

use read_binding::{
    BindingConfig, Cluster, ReadBinding, ReadBindingHandle, ServerDescription, StaticCluster,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn default_servers() -> Vec<ServerDescription> {
    ["replica-1:27017=primary", "replica-2:27017", "replica-3:27017"]
        .iter()
        .filter_map(|s| s.parse::<ServerDescription>().ok())
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Falls back to a local three member replica set when READ_BINDING_SERVERS is unset.
    let mut config = BindingConfig::from_env()?;
    if config.servers.is_empty() {
        config.servers = default_servers();
    }
    info!(
        members = config.servers.len(),
        read_preference = %config.read_preference,
        readers = config.readers,
        "starting pinned read demo"
    );

    let cluster: Arc<dyn Cluster> = Arc::new(StaticCluster::new(config.servers.clone()));
    let handle =
        ReadBindingHandle::new(ReadBinding::pinned_with_selector(cluster, config.selector()));
    let timeout = config.server_selection_timeout();
    let cancel = CancellationToken::new();

    let mut readers = Vec::with_capacity(config.readers);
    for reader in 0..config.readers {
        let fork = handle.fork()?;
        let cancel = cancel.child_token();
        readers.push(tokio::spawn(async move {
            let result = fork.read_connection_source(timeout, &cancel).await;
            fork.dispose();
            result.map(|source| (reader, source.address().to_string()))
        }));
    }

    for reader in readers {
        match reader.await? {
            Ok((id, address)) => info!(reader = id, server.address = %address, "read routed"),
            Err(e) => warn!(error = %e, "read failed"),
        }
    }

    if let Some(server) = handle.pinned_server() {
        println!("All reads pinned to {}", server.address());
    }
    handle.dispose();

    Ok(())
}
