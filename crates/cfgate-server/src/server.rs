//! HTTP server.
//!
//! Accepts TCP connections, serves each one with hyper's HTTP/1 connection
//! driver and runs every request through the middleware [`Pipeline`] with the
//! [`Dispatcher`] as terminal handler. When a client disconnects, hyper drops
//! the request future, which cancels whatever the handler was awaiting.
//!
//! ```rust,ignore
//! let server = Server::new(config.server.clone(), pipeline, dispatcher);
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use cfgate_config::ServerConfig;
use cfgate_core::ApiError;
use cfgate_middleware::{MiddlewareContext, Pipeline, Request, Response, ResponseExt};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The gateway HTTP server.
pub struct Server {
    config: ServerConfig,
    pipeline: Pipeline,
    dispatcher: Arc<Dispatcher>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("http_addr", &self.config.http_addr)
            .field("pipeline", &self.pipeline)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, pipeline: Pipeline, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            pipeline,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Server settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handles one buffered request end to end, without any socket.
    pub async fn handle(&self, request: Request) -> Response {
        let dispatcher = Arc::clone(&self.dispatcher);
        self.pipeline
            .process(MiddlewareContext::new(), request, move |ctx, request| {
                dispatcher.dispatch(ctx, request)
            })
            .await
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr: SocketAddr =
            self.config
                .http_addr
                .parse()
                .map_err(|err: std::net::AddrParseError| ServerError::InvalidAddress {
                    addr: self.config.http_addr.clone(),
                    reason: err.to_string(),
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            server.serve_connection(stream, remote_addr, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(err) => tracing::warn!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let drain_timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = drain_timeout.as_secs(),
            "draining connections"
        );
        if tokio::time::timeout(drain_timeout, tracker.drained()).await.is_err() {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    tracing::debug!(%remote_addr, error = %err, "connection error");
                }
            }
            () = shutdown.recv() => {
                // Let the in-flight request finish, then close.
                conn.as_mut().graceful_shutdown();
                if let Err(err) = conn.await {
                    tracing::debug!(%remote_addr, error = %err, "connection error during shutdown");
                }
            }
        }
    }

    async fn handle_incoming(&self, request: http::Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();
        let limit = self.config.max_body_bytes;

        let collected = tokio::time::timeout(
            self.config.request_timeout(),
            Limited::new(body, limit).collect(),
        )
        .await;

        let bytes: Bytes = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(err)) => {
                let api = if err.downcast_ref::<LengthLimitError>().is_some() {
                    ApiError::invalid_request(format!("request body too large: max {limit} bytes"))
                } else {
                    tracing::debug!(error = %err, "failed to read request body");
                    ApiError::message_parse(BodyReadError(err.to_string()))
                };
                return Response::from_api_error(&api);
            }
            Err(elapsed) => {
                tracing::warn!(method = %parts.method, url = %parts.uri, "timed out reading request body");
                return Response::from_api_error(&ApiError::unknown(elapsed));
            }
        };

        self.handle(http::Request::from_parts(parts, Full::new(bytes))).await
    }
}

/// A request body that could not be read.
#[derive(Debug, thiserror::Error)]
#[error("failed to read request body: {0}")]
struct BodyReadError(String);
