//! # Stoa
//!
//! A thin transport layer that exposes one or more RPC/HTTP service
//! implementations behind a single listening endpoint.
//!
//! Stoa does two things:
//!
//! - **Composition**: any number of independent service descriptors
//!   combine into one [`CompoundServiceDescriptor`] — one route table,
//!   one merged documentation document, one interceptor configuration.
//! - **Orchestration**: [`Server::serve`] owns the listening lifecycle,
//!   racing the accept loop against a [`ShutdownSignal`] and draining
//!   in-flight connections under a configurable [`WaitPolicy`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use stoa::prelude::*;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut services = CompoundServiceDescriptor::new();
//!     services.push(users::descriptor());
//!     services.push(orders::descriptor());
//!
//!     let server = Server::new(
//!         ServerConfig::builder()
//!             .wait_policy(WaitPolicy::Bounded(std::time::Duration::from_secs(30)))
//!             .build(),
//!     );
//!
//!     let listener = TcpListener::bind("0.0.0.0:8080").await?;
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
//!
//! Every served descriptor also gets a `/swagger.json` endpoint carrying
//! the merged documentation of all its services, recomputed per request.

// Re-export the routing substrate
pub use stoa_router as router;

// Re-export descriptor composition
pub use stoa_transport as transport;

// Re-export serve orchestration
pub use stoa_server as server;

pub use stoa_router::{Middleware, Next, Request, Response, ResponseExt, Router};
pub use stoa_server::{
    LogCallback, Server, ServerConfig, ShutdownSignal, WaitPolicy, SWAGGER_PATH,
};
pub use stoa_transport::{
    CompoundServiceDescriptor, ConfigurableServiceDescriptor, DescOption, ServiceDescriptor,
    SwaggerJoiner, UnaryInterceptor,
};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use stoa::prelude::*;
/// ```
pub mod prelude {
    pub use stoa_router::{
        BoxFuture, FnMiddleware, Middleware, Next, Request, Response, ResponseExt, Router,
    };

    pub use stoa_transport::{
        ApiDocument, CompoundServiceDescriptor, ConfigurableServiceDescriptor, DescOption,
        ServiceDescriptor, SwaggerJoiner, SwaggerOption, UnaryInterceptor, UnaryNext,
        UnaryRequest,
    };

    pub use stoa_server::{
        LogCallback, Server, ServerConfig, ShutdownSignal, WaitPolicy, SWAGGER_PATH,
    };
}
