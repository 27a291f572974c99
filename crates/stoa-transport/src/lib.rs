//! # Stoa Transport
//!
//! Service descriptor composition for the stoa transport layer.
//!
//! A service descriptor is a unit that can mount HTTP routes and emit a
//! documentation blob; optionally it also accepts configuration options
//! (such as an RPC interceptor chain). This crate provides:
//!
//! - The [`ServiceDescriptor`] and [`ConfigurableServiceDescriptor`]
//!   capability traits, plus the [`DescOption`] carrier that moves
//!   cross-cutting configuration into descriptors.
//! - [`CompoundServiceDescriptor`]: presents any number of descriptors as
//!   one, fanning out registration and configuration and fanning in
//!   documentation. Compounds nest transparently.
//! - [`SwaggerJoiner`]: merges documentation blobs into one document,
//!   unioning path and schema tables with last-write-wins collisions.
//! - [`UnaryInterceptor`]: composable around-advice for unary RPC calls,
//!   the payload carried by `DescOption::UnaryInterceptor`.
//!
//! ## Example
//!
//! ```
//! use stoa_transport::{CompoundServiceDescriptor, SwaggerJoiner};
//!
//! let compound = CompoundServiceDescriptor::new();
//! assert!(compound.is_empty());
//!
//! // Zero blobs still merge to a valid, empty document.
//! let joiner = SwaggerJoiner::new();
//! let blob = joiner.sum_definitions().unwrap();
//! assert!(!blob.is_empty());
//! ```

pub mod compound;
pub mod error;
pub mod interceptor;
pub mod service;
pub mod swagger;

pub use compound::CompoundServiceDescriptor;
pub use error::{SwaggerError, SwaggerResult};
pub use interceptor::{
    RpcError, UnaryFuture, UnaryInterceptor, UnaryNext, UnaryRequest, UnaryResponse,
};
pub use service::{ConfigurableServiceDescriptor, DescOption, ServiceDescriptor};
pub use swagger::{ApiComponents, ApiDocument, ApiInfo, ApiServer, SwaggerJoiner, SwaggerOption};
