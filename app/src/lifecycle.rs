//! Application lifecycle and graceful shutdown.
//!
//! [`Application::bind`] opens the three listeners; [`Application::run`]
//! serves them with the event consumer alongside until a shutdown signal:
//!
//! 1. Ctrl+C or SIGTERM (or the future given to [`Application::run_until`])
//! 2. Shutdown broadcast to the servers and the consumer
//! 3. Wait for them, bounded by the shutdown timeout
//!
//! A server that fails on its own also triggers shutdown.

use crate::config::Config;
use crate::wiring::{AppComponents, build_app, log_consumer, maintenance_router};
use anyhow::Context as _;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use todokit_grpc::TodoListServer;
use todokit_runtime::EventConsumer;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_stream::wrappers::TcpListenerStream;
use tracing::{error, info, warn};

/// A bound, ready-to-run service.
pub struct Application {
    http: (TcpListener, Router),
    grpc: (TcpListener, TodoListServer),
    maintenance: (TcpListener, Router),
    consumer: EventConsumer,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_timeout: Duration,
}

impl Application {
    /// Build the service from `components` and bind the configured
    /// listeners.
    ///
    /// # Errors
    ///
    /// Fails if an address is invalid or cannot be bound.
    pub async fn bind(
        config: &Config,
        components: &AppComponents,
        metrics: PrometheusHandle,
    ) -> anyhow::Result<Self> {
        let app = build_app(components);
        let (shutdown_tx, _) = broadcast::channel(1);
        let consumer = log_consumer(components, shutdown_tx.subscribe());

        Ok(Self {
            http: (bind("http", config.http_socket_addr()?).await?, app.http),
            grpc: (bind("grpc", config.grpc_socket_addr()?).await?, app.grpc),
            maintenance: (
                bind("maintenance", config.maintenance_socket_addr()?).await?,
                maintenance_router(metrics),
            ),
            consumer,
            shutdown_tx,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Bound HTTP address.
    ///
    /// # Errors
    ///
    /// Fails if the socket has no local address.
    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.0.local_addr()
    }

    /// Bound gRPC address.
    ///
    /// # Errors
    ///
    /// Fails if the socket has no local address.
    pub fn grpc_addr(&self) -> std::io::Result<SocketAddr> {
        self.grpc.0.local_addr()
    }

    /// Bound maintenance address.
    ///
    /// # Errors
    ///
    /// Fails if the socket has no local address.
    pub fn maintenance_addr(&self) -> std::io::Result<SocketAddr> {
        self.maintenance.0.local_addr()
    }

    /// Run until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns the first server failure.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` completes.
    ///
    /// # Errors
    ///
    /// Returns the first server failure.
    pub async fn run_until(self, signal: impl Future<Output = ()> + Send) -> anyhow::Result<()> {
        let Self {
            http,
            grpc,
            maintenance,
            consumer,
            shutdown_tx,
            shutdown_timeout,
        } = self;

        // Subscribed before any server accepts a request.
        let consumer = consumer.start().await;
        let mut servers = JoinSet::new();

        servers.spawn(serve_http("http", http.0, http.1, shutdown_tx.subscribe()));
        servers.spawn(serve_http(
            "maintenance",
            maintenance.0,
            maintenance.1,
            shutdown_tx.subscribe(),
        ));
        servers.spawn(serve_grpc(grpc.0, grpc.1, shutdown_tx.subscribe()));

        let mut failure = None;
        tokio::select! {
            () = signal => info!("Shutdown signal received"),
            Some(joined) = servers.join_next() => {
                failure = Some(flatten(joined));
                warn!("A server stopped unexpectedly, shutting down");
            }
        }

        // Nobody listening means everything already stopped.
        let _ = shutdown_tx.send(());

        let drain = async {
            while let Some(joined) = servers.join_next().await {
                if let Err(e) = flatten(joined) {
                    error!(error = %e, "Server failed during shutdown");
                }
            }
            if let Err(e) = consumer.await {
                warn!(error = %e, "Event consumer task failed");
            }
        };

        if tokio::time::timeout(shutdown_timeout, drain).await.is_err() {
            warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Shutdown timed out, aborting remaining tasks"
            );
        }

        info!("Shutdown complete");
        failure.unwrap_or(Ok(()))
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("http", &self.http.0.local_addr().ok())
            .field("grpc", &self.grpc.0.local_addr().ok())
            .field("maintenance", &self.maintenance.0.local_addr().ok())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

async fn bind(name: &'static str, addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {name} listener on {addr}"))?;
    info!(server = name, address = %listener.local_addr()?, "Listening");
    Ok(listener)
}

async fn serve_http(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .with_context(|| format!("{name} server failed"))?;

    info!(server = name, "Server stopped");
    Ok(())
}

async fn serve_grpc(
    listener: TcpListener,
    service: TodoListServer,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    tonic::transport::Server::builder()
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            let _ = shutdown.recv().await;
        })
        .await
        .context("grpc server failed")?;

    info!(server = "grpc", "Server stopped");
    Ok(())
}

fn flatten(joined: Result<anyhow::Result<()>, tokio::task::JoinError>) -> anyhow::Result<()> {
    joined.context("server task panicked")?
}

/// Completes on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
}
