//! TCP listener that accepts clients and spawns a session task for each

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::session::run_session;
use crate::state::ServerCore;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Main server owning the listening socket and the shared core
pub struct Server {
    listener: TcpListener,
    core: Arc<ServerCore>,
}

impl Server {
    /// Validates the configuration and binds the listening socket
    ///
    /// Failing to bind is fatal: the caller is expected to abort startup.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!(
            "Server listening on {} with a {}x{} board",
            listener.local_addr()?,
            config.dim,
            config.dim
        );

        Ok(Self {
            listener,
            core: Arc::new(ServerCore::new(config.dim, config.flood_window)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the core, shared with every session
    pub fn core(&self) -> Arc<ServerCore> {
        Arc::clone(&self.core)
    }

    /// Accept loop; runs until the task is dropped
    ///
    /// Each connection gets its own task, so a failing or slow client never
    /// holds up accepting the next one.
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            info!("Client connecting from {}", addr);
            if let Err(e) = stream.set_nodelay(true) {
                error!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            let core = Arc::clone(&self.core);
            tokio::spawn(async move {
                run_session(stream, addr, core).await;
            });
        }
    }
}
