//! Handle to a running data-plane listener.

use std::net::SocketAddr;

use tokio::task::JoinHandle;

use super::shutdown::Shutdown;
use crate::http::ProxyServer;

/// A data-plane server running on its own task.
pub struct RunningProxy {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl RunningProxy {
    /// Spawn the accept loop of a bound server.
    pub fn spawn(server: ProxyServer, local_addr: SocketAddr) -> Self {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let task = tokio::spawn(server.run(signal));

        Self {
            local_addr,
            shutdown,
            task,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the socket and abort in-flight connections.
    ///
    /// Returns once the listener has been dropped, so the port can be bound again.
    pub async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Proxy task ended abnormally");
        }
    }
}
