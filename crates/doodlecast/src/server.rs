//! `RelayServer` builder and accept loop.
//!
//! The relay hosts one [`EventBus`] and lets WebSocket clients use it:
//! each connection gets a handler task that turns
//! [`ClientFrame`](doodlecast_protocol::ClientFrame)s into bus calls and
//! pushes events back as
//! [`ServerFrame`](doodlecast_protocol::ServerFrame)s.

use std::net::SocketAddr;

use doodlecast_channel::{BusConfig, EventBus, RelayListener};

use crate::DoodlecastError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use doodlecast::prelude::*;
///
/// # async fn run() -> Result<(), DoodlecastError> {
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    bus_config: BusConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            bus_config: BusConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets retention and queue sizes for the hosted bus.
    pub fn bus_config(mut self, config: BusConfig) -> Self {
        self.bus_config = config;
        self
    }

    /// Binds the listener and starts the bus.
    pub async fn build(self) -> Result<RelayServer, DoodlecastError> {
        let listener = RelayListener::bind(&self.bind_addr).await?;
        let bus = EventBus::new(self.bus_config);
        Ok(RelayServer { listener, bus })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A relay server, bound but not yet accepting.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    listener: RelayListener,
    bus: EventBus,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, DoodlecastError> {
        Ok(self.listener.local_addr()?)
    }

    /// The hosted bus. In-process peers can use it directly alongside
    /// WebSocket clients.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), DoodlecastError> {
        tracing::info!("relay server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let bus = self.bus.clone();
                    tokio::spawn(async move {
                        let conn_id = conn.id();
                        if let Err(e) = handle_connection(conn, bus).await {
                            tracing::debug!(%conn_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
