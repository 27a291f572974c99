//! # Stoa Router
//!
//! HTTP routing substrate for the stoa transport layer.
//!
//! This crate provides the small routing surface the transport needs:
//!
//! - **Exact-path handlers**: register an async handler at a fixed path.
//! - **Prefix mounts**: mount a whole sub-router beneath a path prefix;
//!   the longest matching prefix wins and the prefix is stripped before
//!   the sub-router sees the request.
//! - **Wrapping middlewares**: an ordered list applied around dispatch,
//!   first added runs outermost.
//!
//! Routing is by path only. Method discrimination, parameter extraction
//! and content negotiation are the registered handlers' concern; service
//! descriptors generate handlers that do all three.
//!
//! ## Example
//!
//! ```
//! use stoa_router::{Request, Response, ResponseExt, Router};
//! use http::StatusCode;
//!
//! let mut api = Router::new();
//! api.handle_fn("/ping", |_req: Request| async {
//!     Response::error(StatusCode::OK, "pong")
//! });
//!
//! let mut root = Router::new();
//! root.mount("/api", api);
//! assert_eq!(root.mount_count(), 1);
//! ```

pub mod middleware;
pub mod router;
pub mod types;

pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use router::{HandlerFn, HandlerFuture, Router};
pub use types::{Request, Response, ResponseExt};
