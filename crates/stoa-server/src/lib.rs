//! # Stoa Server
//!
//! Serve orchestration for the stoa transport layer.
//!
//! One [`Server::serve`] call owns one listening lifecycle: it mounts a
//! service descriptor (routes plus a `/swagger.json` documentation
//! endpoint) on a fresh router, accepts connections until the caller's
//! [`ShutdownSignal`] fires, then drains in-flight connections under the
//! configured [`WaitPolicy`]. The session outcome folds the serving and
//! shutdown results into one [`ServeError`], or `Ok(())` on a clean,
//! fully drained stop.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use stoa_server::{Server, ServerConfig, ShutdownSignal, WaitPolicy};
//! use stoa_transport::CompoundServiceDescriptor;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("0.0.0.0:8080").await?;
//!     let mut services = CompoundServiceDescriptor::new();
//!     // services.push(UsersService::descriptor());
//!
//!     let server = Server::new(
//!         ServerConfig::builder()
//!             .wait_policy(WaitPolicy::Unbounded)
//!             .build(),
//!     );
//!     server
//!         .serve(
//!             ShutdownSignal::with_os_signals(),
//!             Arc::new(services),
//!             listener,
//!             None,
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder, WaitPolicy};
pub use error::{DrainError, ServeError};
pub use server::{LogCallback, Server, SWAGGER_PATH};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
