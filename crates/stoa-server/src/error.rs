//! Serve session failure types.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Why the connection drain phase of a shutdown failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrainError {
    /// The wait policy elapsed with connections still open.
    #[error("gave up after {waited:?} with {active} connections still active")]
    TimedOut {
        /// How long the drain waited before giving up.
        waited: Duration,
        /// Connections still open when the wait elapsed.
        active: usize,
    },

    /// The shutdown watcher vanished without reporting an outcome.
    #[error("shutdown watcher dropped without reporting an outcome")]
    WatcherLost,
}

/// Why a serve session ended abnormally.
///
/// A session can fail on the serving side, on the shutdown side, or on
/// both at once; [`ServeError::ServeAndShutdown`] carries both causes and
/// displays them joined by `;`.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener's local address could not be read.
    #[error("failed to read listener address: {0}")]
    ListenerAddr(#[source] io::Error),

    /// The accept loop failed before shutdown was requested.
    #[error("error while serving HTTP on {addr}: {source}")]
    Serve {
        /// Address the session was serving on.
        addr: SocketAddr,
        /// The accept loop failure.
        source: io::Error,
    },

    /// The graceful drain failed.
    #[error("error while shutting down HTTP server on {addr}: {source}")]
    Shutdown {
        /// Address the session was serving on.
        addr: SocketAddr,
        /// The drain failure.
        source: DrainError,
    },

    /// Both the accept loop and the drain failed.
    #[error("{serve}; {shutdown}")]
    ServeAndShutdown {
        /// The accept loop failure.
        serve: Box<ServeError>,
        /// The drain failure, kept as the error's cause.
        #[source]
        shutdown: Box<ServeError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    #[test]
    fn test_timed_out_reports_connection_count() {
        let err = DrainError::TimedOut {
            waited: Duration::from_secs(3),
            active: 4,
        };

        let message = err.to_string();
        assert!(message.contains("3s"));
        assert!(message.contains("4 connections"));
    }

    #[test]
    fn test_serve_error_names_the_address() {
        let err = ServeError::Serve {
            addr: addr(),
            source: io::Error::other("accept failed"),
        };

        let message = err.to_string();
        assert!(message.contains("127.0.0.1:8080"));
        assert!(message.contains("accept failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_shutdown_error_keeps_drain_cause() {
        let err = ServeError::Shutdown {
            addr: addr(),
            source: DrainError::WatcherLost,
        };

        assert!(err.to_string().contains("shutting down"));
        assert!(err.source().unwrap().to_string().contains("watcher"));
    }

    #[test]
    fn test_combined_error_mentions_both_causes() {
        let serve = ServeError::Serve {
            addr: addr(),
            source: io::Error::other("listener exploded"),
        };
        let shutdown = ServeError::Shutdown {
            addr: addr(),
            source: DrainError::TimedOut {
                waited: Duration::from_secs(1),
                active: 2,
            },
        };

        let err = ServeError::ServeAndShutdown {
            serve: Box::new(serve),
            shutdown: Box::new(shutdown),
        };

        let message = err.to_string();
        assert!(message.contains("listener exploded"));
        assert!(message.contains("2 connections"));
        assert!(message.contains("; "));
    }
}
