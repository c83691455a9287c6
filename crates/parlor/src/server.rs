//! `ParlorServer` builder and accept loop.
//!
//! This is the entry point for running a Parlor server. It ties the
//! layers together: transport → handler → coordinator → dispatcher.

use std::net::SocketAddr;
use std::time::Duration;

use parlor_tick::SweepTicker;
use parlor_transport::{Incoming, Transport, WebSocketTransport};
use tokio::task::JoinHandle;

use crate::ParlorError;
use crate::config::{EffectTimings, RegistryConfig};
use crate::coordinator::{CoordinatorHandle, spawn_coordinator};
use crate::dispatcher::Dispatcher;
use crate::gateway::Hub;
use crate::handler::handle_connection;

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = ParlorServerBuilder::new()
///     .bind("0.0.0.0:3000")
///     .timings(EffectTimings::default())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    timings: EffectTimings,
    handshake_timeout: Duration,
}

/// How long a peer gets to finish the WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            registry_config: RegistryConfig::default(),
            timings: EffectTimings::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets idle timeout and sweep period.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Sets the delays of the deferred game transitions.
    pub fn timings(mut self, timings: EffectTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Sets how long an accepted peer may take to complete the upgrade
    /// before it is dropped.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listener and starts the coordinator.
    pub async fn build(self) -> Result<ParlorServer, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let sweeper = SweepTicker::new(self.registry_config.sweep_interval);
        let dispatcher = Dispatcher::new(self.registry_config, self.timings, Hub::new());
        let (coordinator, coordinator_task) = spawn_coordinator(dispatcher, sweeper);

        Ok(ParlorServer {
            transport,
            coordinator,
            coordinator_task,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer {
    transport: WebSocketTransport,
    coordinator: CoordinatorHandle,
    coordinator_task: JoinHandle<()>,
    handshake_timeout: Duration,
}

impl ParlorServer {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ParlorError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop.
    ///
    /// Spawns a task for each accepted peer, which runs the upgrade under
    /// the handshake timeout and then the connection handler. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(incoming) => {
                    let coordinator = self.coordinator.clone();
                    let deadline = self.handshake_timeout;
                    tokio::spawn(async move {
                        let peer = incoming.peer_addr();
                        let conn = match tokio::time::timeout(deadline, incoming.upgrade()).await {
                            Ok(Ok(conn)) => conn,
                            Ok(Err(e)) => {
                                tracing::debug!(%peer, error = %e, "handshake failed");
                                return;
                            }
                            Err(_) => {
                                tracing::debug!(%peer, ?deadline, "handshake timed out");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, coordinator).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
            if self.coordinator_task.is_finished() {
                tracing::error!("coordinator exited, shutting down");
                return Ok(());
            }
        }
    }
}
