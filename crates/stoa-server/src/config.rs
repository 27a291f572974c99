//! Serve configuration types.
//!
//! [`ServerConfig`] is the immutable snapshot a serve session runs from:
//! the base router to mount, wrapping middlewares, an optional composed
//! unary interceptor, and the shutdown wait policy. It is built once
//! through [`ServerConfigBuilder`] and never mutated afterwards.
//!
//! # Example
//!
//! ```rust
//! use stoa_server::{ServerConfig, WaitPolicy};
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .wait_policy(WaitPolicy::Bounded(Duration::from_secs(30)))
//!     .build();
//!
//! assert_eq!(config.wait_policy(), WaitPolicy::Bounded(Duration::from_secs(30)));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use stoa_router::{Middleware, Router};
use stoa_transport::UnaryInterceptor;

/// How long shutdown waits for in-flight connections to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Do not wait. Connections still open when shutdown begins are
    /// reported as a drain failure.
    #[default]
    NoWait,

    /// Wait up to the given duration.
    Bounded(Duration),

    /// Wait until every connection has finished, however long that takes.
    Unbounded,
}

/// Configuration snapshot for a serve session.
///
/// Use [`ServerConfig::builder()`] to construct instances.
pub struct ServerConfig {
    /// Base router mounted at the root path.
    mux: Router,

    /// Wrapping middlewares, first entry runs outermost.
    middlewares: Vec<Arc<dyn Middleware>>,

    /// Composed unary interceptor pushed into configurable descriptors.
    interceptor: Option<UnaryInterceptor>,

    /// Shutdown wait policy.
    wait_policy: WaitPolicy,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stoa_server::ServerConfig;
    ///
    /// let config = ServerConfig::builder().build();
    /// assert!(config.interceptor().is_none());
    /// ```
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the base router mounted at the root path.
    #[must_use]
    pub fn mux(&self) -> &Router {
        &self.mux
    }

    /// Returns the wrapping middlewares, outermost first.
    #[must_use]
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Returns the composed unary interceptor, if one was configured.
    #[must_use]
    pub fn interceptor(&self) -> Option<&UnaryInterceptor> {
        self.interceptor.as_ref()
    }

    /// Returns the shutdown wait policy.
    #[must_use]
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait_policy
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("mux", &self.mux)
            .field(
                "middlewares",
                &self
                    .middlewares
                    .iter()
                    .map(|middleware| middleware.name())
                    .collect::<Vec<_>>(),
            )
            .field("interceptor", &self.interceptor.is_some())
            .field("wait_policy", &self.wait_policy)
            .finish()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Default)]
pub struct ServerConfigBuilder {
    mux: Router,
    middlewares: Vec<Arc<dyn Middleware>>,
    interceptors: Vec<UnaryInterceptor>,
    wait_policy: WaitPolicy,
}

impl ServerConfigBuilder {
    /// Creates a builder with an empty router, no middlewares, no
    /// interceptor, and [`WaitPolicy::NoWait`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the base router mounted at the root path.
    #[must_use]
    pub fn mux(mut self, mux: Router) -> Self {
        self.mux = mux;
        self
    }

    /// Appends a wrapping middleware. The first appended runs outermost.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends a unary interceptor.
    ///
    /// All appended interceptors are chained into one at build time, the
    /// first appended running outermost.
    #[must_use]
    pub fn unary_interceptor(mut self, interceptor: UnaryInterceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Sets the shutdown wait policy.
    #[must_use]
    pub fn wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// Builds the configuration snapshot.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        let interceptor = if self.interceptors.is_empty() {
            None
        } else {
            Some(UnaryInterceptor::chain(self.interceptors))
        };

        ServerConfig {
            mux: self.mux,
            middlewares: self.middlewares,
            interceptor,
            wait_policy: self.wait_policy,
        }
    }
}

impl fmt::Debug for ServerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfigBuilder")
            .field("mux", &self.mux)
            .field(
                "middlewares",
                &self
                    .middlewares
                    .iter()
                    .map(|middleware| middleware.name())
                    .collect::<Vec<_>>(),
            )
            .field("interceptors", &self.interceptors.len())
            .field("wait_policy", &self.wait_policy)
            .finish()
    }
}
