//! The serve orchestrator.
//!
//! One [`Server::serve`] call owns one listening lifecycle: it builds a
//! fresh root router for the descriptor, accepts connections until the
//! caller's stop signal fires or the listener fails, and drains in-flight
//! connections according to the configured [`WaitPolicy`]. A background
//! watcher owns the shutdown transition, so exactly one drain happens per
//! session no matter how serving ends.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use stoa_server::{Server, ServerConfig, ShutdownSignal};
//! use stoa_transport::CompoundServiceDescriptor;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("0.0.0.0:8080").await?;
//!     let descriptor = Arc::new(CompoundServiceDescriptor::new());
//!
//!     let server = Server::new(ServerConfig::default());
//!     server
//!         .serve(ShutdownSignal::with_os_signals(), descriptor, listener, None)
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::Level;

use stoa_router::{Response, ResponseExt, Router};
use stoa_transport::{DescOption, ServiceDescriptor};

use crate::config::{ServerConfig, WaitPolicy};
use crate::error::{DrainError, ServeError};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Well-known path serving the descriptor's merged documentation.
pub const SWAGGER_PATH: &str = "/swagger.json";

/// Observational sink for serve lifecycle notices.
///
/// Receives a severity and a free-text message for the serve-started and
/// shutdown-started transitions. Never affects control flow.
pub type LogCallback = Arc<dyn Fn(Level, &str) + Send + Sync>;

/// Orchestrates serve sessions from an immutable configuration snapshot.
///
/// The server itself is stateless between sessions; each [`serve`](Self::serve)
/// call runs one full lifecycle and a server may run any number of them.
#[derive(Debug, Default)]
pub struct Server {
    /// Configuration snapshot shared by every session.
    config: ServerConfig,
}

impl Server {
    /// Creates a server from a configuration snapshot.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves `descriptor` on `listener` until `stop` fires, then drains.
    ///
    /// The session walks five phases: build a fresh root router (the
    /// configured middlewares wrap everything, the configured mux is
    /// mounted at `/`, and [`SWAGGER_PATH`] serves the descriptor's
    /// documentation, recomputed per request), push the configured
    /// interceptor into the descriptor when it takes options, register the
    /// descriptor's routes, accept connections until `stop` fires or the
    /// listener fails, then drain in-flight connections per the configured
    /// [`WaitPolicy`].
    ///
    /// A background watcher owns the shutdown transition: exactly one
    /// drain happens per session no matter how serving ends. The
    /// `log_callback`, when present, receives the serve-started and
    /// shutdown-started notices.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener address cannot be read, when the
    /// accept loop fails, when the drain fails, or a combined error
    /// naming both causes when serving and shutdown fail in the same
    /// session.
    pub async fn serve(
        &self,
        stop: ShutdownSignal,
        descriptor: Arc<dyn ServiceDescriptor>,
        listener: TcpListener,
        log_callback: Option<LogCallback>,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr().map_err(ServeError::ListenerAddr)?;
        let router = Arc::new(self.prepare_router(&descriptor));

        let drain = ShutdownSignal::new();
        let tracker = ConnectionTracker::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        // The watcher owns the shutdown transition. It wakes on the
        // caller's stop signal or on the session's own drain signal
        // (tripped when the accept loop ends first), performs the one
        // drain, and hands the outcome back over the single-slot channel.
        {
            let stop = stop.clone();
            let drain = drain.clone();
            let tracker = tracker.clone();
            let callback = log_callback.clone();
            let policy = self.config.wait_policy();

            tokio::spawn(async move {
                tokio::select! {
                    () = stop.triggered() => {}
                    () = drain.triggered() => {}
                }
                drain.trigger();

                emit(
                    callback.as_ref(),
                    Level::INFO,
                    &format!("shutting down HTTP server on {addr} gracefully"),
                );

                let outcome = drain_connections(&tracker, policy).await;
                let _ = outcome_tx.send(outcome);
            });
        }

        emit(
            log_callback.as_ref(),
            Level::INFO,
            &format!("serving HTTP on {addr}"),
        );

        let mut serve_error: Option<io::Error> = None;
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let router = Arc::clone(&router);
                        let drain = drain.clone();
                        let guard = tracker.track();

                        tokio::spawn(async move {
                            if let Err(error) =
                                handle_connection(router, stream, drain).await
                            {
                                tracing::error!(%remote_addr, %error, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(error) => {
                        tracing::error!(%error, "failed to accept connection");
                        serve_error = Some(error);
                        break;
                    }
                },

                () = stop.triggered() => break,
            }
        }

        // Stop accepting before the drain wait; in-flight connections are
        // unaffected.
        drop(listener);
        drain.trigger();

        let drain_error = match outcome_rx.await {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(error),
            Err(_) => Some(DrainError::WatcherLost),
        };

        reconcile(addr, serve_error, drain_error)
    }

    /// Builds the per-session root router.
    ///
    /// Wrapping middlewares go on first, the configured mux is mounted at
    /// `/`, and the documentation endpoint is registered as an exact
    /// route, so it wins over the mux. The configured interceptor, if
    /// any, is pushed into the descriptor before its routes register.
    fn prepare_router(&self, descriptor: &Arc<dyn ServiceDescriptor>) -> Router {
        let mut root = Router::new();

        for middleware in self.config.middlewares() {
            root.wrap_shared(Arc::clone(middleware));
        }

        root.mount("/", self.config.mux().clone());

        let docs = Arc::clone(descriptor);
        root.handle_fn(SWAGGER_PATH, move |_request| {
            let descriptor = Arc::clone(&docs);
            async move { swagger_response(descriptor.as_ref()) }
        });

        if let Some(interceptor) = self.config.interceptor() {
            if let Some(configurable) = descriptor.as_configurable() {
                configurable.apply(&[DescOption::UnaryInterceptor(interceptor.clone())]);
            }
        }

        descriptor.register_http(&mut root);
        root
    }
}

/// Renders the descriptor's documentation, merged fresh for this request.
fn swagger_response(descriptor: &dyn ServiceDescriptor) -> Response {
    match descriptor.swagger_def(&[]) {
        Ok(blob) => Response::json(StatusCode::OK, blob),
        Err(error) => {
            tracing::error!(%error, "failed to merge documentation");
            Response::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DOCUMENTATION_ERROR",
                &error.to_string(),
            )
        }
    }
}

/// Drives one connection, honoring the drain signal.
///
/// When drain fires mid-connection, hyper stops accepting new requests on
/// it and the connection is driven until in-flight requests finish.
async fn handle_connection(
    router: Arc<Router>,
    stream: TcpStream,
    drain: ShutdownSignal,
) -> hyper::Result<()> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |request: hyper::Request<Incoming>| {
        let router = Arc::clone(&router);
        async move {
            let (parts, body) = request.into_parts();
            let bytes = body.collect().await?.to_bytes();
            let request = http::Request::from_parts(parts, Full::new(bytes));
            Ok::<_, hyper::Error>(router.dispatch(request).await)
        }
    });

    let connection = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(connection);

    tokio::select! {
        result = connection.as_mut() => result,
        () = drain.triggered() => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    }
}

/// Waits out the drain phase according to `policy`.
async fn drain_connections(
    tracker: &ConnectionTracker,
    policy: WaitPolicy,
) -> Result<(), DrainError> {
    match policy {
        WaitPolicy::NoWait => {
            let active = tracker.active();
            if active == 0 {
                Ok(())
            } else {
                Err(DrainError::TimedOut {
                    waited: Duration::ZERO,
                    active,
                })
            }
        }
        WaitPolicy::Bounded(limit) => match tokio::time::timeout(limit, tracker.idle()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(DrainError::TimedOut {
                waited: limit,
                active: tracker.active(),
            }),
        },
        WaitPolicy::Unbounded => {
            tracker.idle().await;
            Ok(())
        }
    }
}

/// Combines the serving and shutdown outcomes into the session result.
fn reconcile(
    addr: SocketAddr,
    serve_error: Option<io::Error>,
    drain_error: Option<DrainError>,
) -> Result<(), ServeError> {
    let serve = serve_error.map(|source| ServeError::Serve { addr, source });
    let shutdown = drain_error.map(|source| ServeError::Shutdown { addr, source });

    match (serve, shutdown) {
        (None, None) => Ok(()),
        (Some(error), None) | (None, Some(error)) => Err(error),
        (Some(serve), Some(shutdown)) => Err(ServeError::ServeAndShutdown {
            serve: Box::new(serve),
            shutdown: Box::new(shutdown),
        }),
    }
}

/// Logs a lifecycle notice and forwards it to the callback, if any.
fn emit(callback: Option<&LogCallback>, level: Level, message: &str) {
    if level == Level::ERROR {
        tracing::error!("{message}");
    } else if level == Level::WARN {
        tracing::warn!("{message}");
    } else {
        tracing::info!("{message}");
    }

    if let Some(callback) = callback {
        callback(level, message);
    }
}
