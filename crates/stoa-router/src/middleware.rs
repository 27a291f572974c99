//! Wrapping middleware around route dispatch.
//!
//! Middlewares form an onion: the first middleware added to a
//! [`Router`](crate::Router) sees the request first and the response last.
//! Each middleware receives the request and a [`Next`] continuation and
//! either drives the continuation or short-circuits with its own response.
//!
//! # Example
//!
//! ```
//! use stoa_router::{BoxFuture, Middleware, Next, Request, Response};
//!
//! struct ServerHeader;
//!
//! impl Middleware for ServerHeader {
//!     fn name(&self) -> &'static str {
//!         "server-header"
//!     }
//!
//!     fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let mut response = next.run(request).await;
//!             response
//!                 .headers_mut()
//!                 .insert(http::header::SERVER, "stoa".parse().unwrap());
//!             response
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::types::{Request, Response};

/// A boxed future resolving to `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An HTTP middleware wrapping route dispatch.
///
/// Implementations must call [`Next::run`] exactly once to continue the
/// chain, or not at all to short-circuit.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in log events.
    fn name(&self) -> &'static str;

    /// Processes the request, calling `next` to continue dispatch.
    fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// Continuation to the rest of the dispatch chain.
///
/// Consumed by [`Next::run`], so it can be driven at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to run before dispatch.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of the chain: route the request.
    Dispatch(Box<dyn FnOnce(Request) -> BoxFuture<'a, Response> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that runs `middleware` before the rest of the chain.
    pub(crate) fn chain(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal `Next` that performs route dispatch.
    pub(crate) fn dispatch<F>(f: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'a, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Dispatch(Box::new(f)),
        }
    }

    /// Runs the remainder of the chain with `request`.
    pub async fn run(self, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.handle(request, *next).await,
            NextInner::Dispatch(dispatch) => dispatch(request).await,
        }
    }
}

/// A middleware built from a function.
///
/// The function receives the request and the [`Next`] continuation and
/// returns a boxed response future. Plain `fn` items fit the required
/// higher-ranked signature directly:
///
/// ```
/// use stoa_router::{BoxFuture, FnMiddleware, Middleware, Next, Request, Response};
///
/// fn passthrough(request: Request, next: Next<'_>) -> BoxFuture<'_, Response> {
///     Box::pin(next.run(request))
/// }
///
/// let middleware = FnMiddleware::new("passthrough", passthrough);
/// assert_eq!(middleware.name(), "passthrough");
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a middleware from a name and a dispatch-wrapping function.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        (self.func)(request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    /// Appends its name to the `via` header on the way out.
    struct TagMiddleware {
        name: &'static str,
    }

    impl Middleware for TagMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut response = next.run(request).await;
                response.headers_mut().append(
                    http::header::VIA,
                    self.name.parse().expect("valid header value"),
                );
                response
            })
        }
    }

    fn make_request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_router() -> Router {
        let mut router = Router::new();
        router.handle_fn("/x", |_req| async { Response::error(StatusCode::OK, "done") });
        router
    }

    #[tokio::test]
    async fn test_unwrapped_dispatch_reaches_handler() {
        let router = ok_router();
        let response = router.dispatch(make_request("/x")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_runs_first_added_outermost() {
        let mut router = ok_router();
        router.wrap(TagMiddleware { name: "outer" });
        router.wrap(TagMiddleware { name: "inner" });

        let response = router.dispatch(make_request("/x")).await;
        assert_eq!(response.status(), StatusCode::OK);

        // Responses pass back inside-out, so the inner tag lands first.
        let tags: Vec<_> = response
            .headers()
            .get_all(http::header::VIA)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["inner", "outer"]);
    }

    #[tokio::test]
    async fn test_middleware_short_circuit() {
        struct Reject;

        impl Middleware for Reject {
            fn name(&self) -> &'static str {
                "reject"
            }

            fn handle<'a>(&'a self, _request: Request, _next: Next<'a>) -> BoxFuture<'a, Response> {
                Box::pin(async { Response::error(StatusCode::FORBIDDEN, "denied") })
            }
        }

        let mut router = ok_router();
        router.wrap(Reject);

        let response = router.dispatch(make_request("/x")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_fn_middleware_wraps_dispatch() {
        fn tag(request: Request, next: Next<'_>) -> BoxFuture<'_, Response> {
            Box::pin(async move {
                let mut response = next.run(request).await;
                response
                    .headers_mut()
                    .insert(http::header::VIA, "fn".parse().unwrap());
                response
            })
        }

        let middleware = FnMiddleware::new("fn-tag", tag);
        assert_eq!(middleware.name(), "fn-tag");

        let mut router = ok_router();
        router.wrap(middleware);

        let response = router.dispatch(make_request("/x")).await;
        assert_eq!(response.headers().get(http::header::VIA).unwrap(), "fn");
    }

    #[tokio::test]
    async fn test_middleware_sees_request_before_handler() {
        struct PathRewrite;

        impl Middleware for PathRewrite {
            fn name(&self) -> &'static str {
                "path-rewrite"
            }

            fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
                Box::pin(async move {
                    let (mut parts, body) = request.into_parts();
                    parts.uri = http::Uri::from_static("/x");
                    next.run(Request::from_parts(parts, body)).await
                })
            }
        }

        let mut router = ok_router();
        router.wrap(PathRewrite);

        // The original path has no handler; the middleware rewrites it.
        let response = router.dispatch(make_request("/missing")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
