use std::sync::Arc;

use crate::server::{ServerAddress, ServerRef};

/// The server a read should be sent to, as handed out by a binding.
///
/// Opening connections is the transport's job; this only carries the target.
#[derive(Debug, Clone)]
pub struct ConnectionSource {
    server: ServerRef,
}

impl ConnectionSource {
    pub fn new(server: ServerRef) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &ServerRef {
        &self.server
    }

    pub fn address(&self) -> &ServerAddress {
        self.server.address()
    }

    /// Whether both sources target the very same server instance.
    pub fn same_server(&self, other: &ConnectionSource) -> bool {
        Arc::ptr_eq(&self.server, &other.server)
    }
}
