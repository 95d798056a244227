//! Binding, accepting and shutting down.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
use wharf_http::connection::{ConnectionConfig, ConnectionRegistry, HttpConnection};

use crate::app::App;
use crate::config::ServerConfig;

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("app must be set")]
    MissingApp,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("failed to wait for the shutdown signal: {0}")]
    Signal(io::Error),
}

#[derive(Debug)]
pub struct ServerBuilder {
    app: Option<App>,
    config: ServerConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { app: None, config: ServerConfig::default() }
    }

    pub fn app(mut self, app: App) -> Self {
        self.app = Some(app);
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.config.max_connections = Some(max_connections);
        self
    }

    pub fn max_request_size(mut self, max_request_size: usize) -> Self {
        self.config.max_request_size = max_request_size;
        self
    }

    /// Sets the idle window, rounded up to whole seconds.
    pub fn keep_alive_timeout(mut self, timeout: Duration) -> Self {
        self.config.keep_alive_timeout = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    pub fn log_level(mut self, log_level: impl Into<String>) -> Self {
        self.config.log_level = log_level.into();
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let app = self.app.ok_or(ServerBuildError::MissingApp)?;
        Ok(Server::with_config(app, self.config))
    }
}

#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    config: ServerConfig,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn with_config(app: App, config: ServerConfig) -> Self {
        Self { app: Arc::new(app), config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address without accepting yet.
    pub async fn listen(self) -> Result<Listener, ServerError> {
        let address = self.config.address();
        let tcp_listener =
            TcpListener::bind(address.as_str()).await.map_err(|source| ServerError::Bind { address: address.clone(), source })?;

        info!(%address, "start listening");
        Ok(Listener {
            tcp_listener,
            app: self.app,
            connection_config: self.config.connection_config(),
            limit: self.config.max_connections.map(|max| Arc::new(Semaphore::new(max))),
            registry: ConnectionRegistry::new(),
            token: CancellationToken::new(),
        })
    }

    /// Installs a log subscriber, serves until ctrl-c, then force-closes
    /// every open connection.
    pub async fn start(self) -> Result<(), ServerError> {
        let subscriber = FmtSubscriber::builder().with_max_level(self.config.level()).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            warn!(cause = %e, "a global subscriber is already installed, keeping it");
        }

        let listener = self.listen().await?;
        let shutdown = listener.shutdown_handle();
        let serving = tokio::spawn(listener.serve());

        let signal = tokio::signal::ctrl_c().await;
        info!("shutting down");
        shutdown.shutdown();
        if let Err(e) = serving.await {
            error!(cause = %e, "accept loop ended abnormally");
        }
        signal.map_err(ServerError::Signal)
    }
}

/// A bound socket ready to accept connections.
#[derive(Debug)]
pub struct Listener {
    tcp_listener: TcpListener,
    app: Arc<App>,
    connection_config: ConnectionConfig,
    limit: Option<Arc<Semaphore>>,
    registry: ConnectionRegistry,
    token: CancellationToken,
}

impl Listener {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp_listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { token: self.token.clone(), registry: self.registry.clone() }
    }

    /// Accepts until shut down, serving each connection on its own task.
    ///
    /// With a connection limit, accepting pauses while the limit is reached.
    pub async fn serve(self) {
        loop {
            let permit = match &self.limit {
                Some(limit) => tokio::select! {
                    () = self.token.cancelled() => break,
                    permit = Arc::clone(limit).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            let (tcp_stream, remote_addr) = tokio::select! {
                () = self.token.cancelled() => break,
                accepted = self.tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let app = Arc::clone(&self.app);
            let config = self.connection_config;
            let spawned = self.registry.spawn(async move {
                let _permit = permit;
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer, Some(remote_addr), config);
                match connection.process(app).await {
                    Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                }
            });
            if !spawned {
                info!(%remote_addr, "shut down while accepting, connection dropped");
                break;
            }
        }

        info!("stopped accepting connections");
    }
}

/// Stops a [`Listener`] from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
    registry: ConnectionRegistry,
}

impl ShutdownHandle {
    /// Stops accepting and aborts every open connection. Returns how many
    /// connections were closed.
    pub fn shutdown(&self) -> usize {
        self.token.cancel();
        self.registry.close_all()
    }

    pub fn open_connections(&self) -> usize {
        self.registry.len()
    }
}
