use crate::server::ServerRef;

/// Filters cluster members down to the ones eligible for an operation.
///
/// Selectors are pure: the cluster hands them a snapshot of its members and
/// picks among whatever comes back.
pub trait ServerSelector: Send + Sync {
    fn select(&self, servers: &[ServerRef]) -> Vec<ServerRef>;

    // Human readable form used in timeout errors and logs
    fn describe(&self) -> String {
        "server selector".to_string()
    }
}
