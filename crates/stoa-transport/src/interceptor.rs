//! Composable around-advice for unary RPC calls.
//!
//! An interceptor sees every unary invocation before the handler does and
//! every outcome on the way back. Interceptors compose with
//! [`UnaryInterceptor::chain`]; the orchestration layer installs the
//! composed result into descriptors through
//! [`DescOption::UnaryInterceptor`](crate::DescOption::UnaryInterceptor).
//!
//! # Example
//!
//! ```
//! use stoa_transport::{UnaryInterceptor, UnaryRequest};
//! use bytes::Bytes;
//!
//! let logging = UnaryInterceptor::new(|request: UnaryRequest, next| async move {
//!     let method = request.method().to_string();
//!     let outcome = next.run(request).await;
//!     println!("{method}: ok={}", outcome.is_ok());
//!     outcome
//! });
//!
//! # let _ = logging;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use stoa_router::BoxFuture;
use thiserror::Error;

/// A unary RPC invocation as seen by interceptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryRequest {
    method: String,
    payload: Bytes,
}

impl UnaryRequest {
    /// Creates a request for a full method name and encoded payload.
    #[must_use]
    pub fn new(method: impl Into<String>, payload: Bytes) -> Self {
        Self {
            method: method.into(),
            payload,
        }
    }

    /// The full method name, e.g. `/users.Users/GetUser`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The encoded request payload.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Returns this request with the payload replaced.
    #[must_use]
    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }
}

/// The failure side of a unary invocation.
///
/// Interceptors may observe handler errors or inject their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rpc error (code {code}): {message}")]
pub struct RpcError {
    /// Numeric status code, gRPC-style (0 = ok, 13 = internal).
    pub code: u32,
    /// Human-readable failure description.
    pub message: String,
}

impl RpcError {
    /// Creates an error with an explicit status code.
    #[must_use]
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an internal error (code 13).
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(13, message)
    }
}

/// Outcome of a unary invocation: encoded response payload or failure.
pub type UnaryResponse = Result<Bytes, RpcError>;

/// A boxed future resolving to a unary outcome.
pub type UnaryFuture = BoxFuture<'static, UnaryResponse>;

/// Consume-once continuation to the wrapped handler, or to the next
/// interceptor in a chain.
pub struct UnaryNext {
    inner: Box<dyn FnOnce(UnaryRequest) -> UnaryFuture + Send>,
}

impl UnaryNext {
    /// Wraps a handler as the terminal continuation.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: FnOnce(UnaryRequest) -> Fut + Send + 'static,
        Fut: Future<Output = UnaryResponse> + Send + 'static,
    {
        Self {
            inner: Box::new(move |request| Box::pin(handler(request))),
        }
    }

    /// Runs the remainder of the invocation with `request`.
    pub async fn run(self, request: UnaryRequest) -> UnaryResponse {
        (self.inner)(request).await
    }
}

impl fmt::Debug for UnaryNext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryNext").finish_non_exhaustive()
    }
}

/// Around-advice for unary RPC calls.
///
/// Cheap to clone; clones share the same underlying function.
#[derive(Clone)]
pub struct UnaryInterceptor {
    inner: Arc<dyn Fn(UnaryRequest, UnaryNext) -> UnaryFuture + Send + Sync>,
}

impl UnaryInterceptor {
    /// Creates an interceptor from an async function over the request and
    /// the continuation.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(UnaryRequest, UnaryNext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = UnaryResponse> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |request, next| Box::pin(f(request, next))),
        }
    }

    /// The identity interceptor: runs the continuation unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(|request, next: UnaryNext| next.run(request))
    }

    /// Composes interceptors into one. The first interceptor runs
    /// outermost: it sees the request first and the outcome last.
    ///
    /// Chaining nothing yields [`identity`](Self::identity).
    #[must_use]
    pub fn chain<I>(interceptors: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut list: Vec<Self> = interceptors.into_iter().collect();
        let Some(innermost) = list.pop() else {
            return Self::identity();
        };
        list.into_iter()
            .rev()
            .fold(innermost, |inner, outer| Self::compose(outer, inner))
    }

    /// Drives `handler` for `request` with this interceptor around it.
    pub async fn intercept<F, Fut>(&self, request: UnaryRequest, handler: F) -> UnaryResponse
    where
        F: FnOnce(UnaryRequest) -> Fut + Send + 'static,
        Fut: Future<Output = UnaryResponse> + Send + 'static,
    {
        (self.inner)(request, UnaryNext::new(handler)).await
    }

    /// Invokes this interceptor with an explicit continuation.
    fn invoke(&self, request: UnaryRequest, next: UnaryNext) -> UnaryFuture {
        (self.inner)(request, next)
    }

    /// Wraps `inner` with `outer`.
    fn compose(outer: Self, inner: Self) -> Self {
        Self::new(move |request, next| {
            let outer = outer.clone();
            let inner = inner.clone();
            async move {
                let continuation = UnaryNext {
                    inner: Box::new(move |req| inner.invoke(req, next)),
                };
                outer.invoke(request, continuation).await
            }
        })
    }
}

impl fmt::Debug for UnaryInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryInterceptor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    /// An interceptor that records entry and exit around the continuation.
    fn tracing_interceptor(name: &'static str, trace: &Trace) -> UnaryInterceptor {
        let trace = Arc::clone(trace);
        UnaryInterceptor::new(move |request, next: UnaryNext| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push(format!("enter:{name}"));
                let outcome = next.run(request).await;
                trace.lock().unwrap().push(format!("exit:{name}"));
                outcome
            }
        })
    }

    fn echo_handler(request: UnaryRequest) -> impl Future<Output = UnaryResponse> {
        async move { Ok(request.payload().clone()) }
    }

    #[tokio::test]
    async fn test_identity_passes_through() {
        let interceptor = UnaryInterceptor::identity();
        let request = UnaryRequest::new("/svc/Echo", Bytes::from_static(b"payload"));

        let outcome = interceptor.intercept(request, echo_handler).await;
        assert_eq!(outcome.unwrap(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn test_chain_of_zero_is_identity() {
        let interceptor = UnaryInterceptor::chain([]);
        let request = UnaryRequest::new("/svc/Echo", Bytes::from_static(b"x"));

        let outcome = interceptor.intercept(request, echo_handler).await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn test_chain_runs_first_added_outermost() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let chained = UnaryInterceptor::chain([
            tracing_interceptor("a", &trace),
            tracing_interceptor("b", &trace),
            tracing_interceptor("c", &trace),
        ]);

        let request = UnaryRequest::new("/svc/Echo", Bytes::new());
        chained.intercept(request, echo_handler).await.unwrap();

        let events = trace.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["enter:a", "enter:b", "enter:c", "exit:c", "exit:b", "exit:a"]
        );
    }

    #[tokio::test]
    async fn test_interceptor_can_rewrite_request() {
        let rewrite = UnaryInterceptor::new(|request: UnaryRequest, next: UnaryNext| async move {
            let request = request.with_payload(Bytes::from_static(b"rewritten"));
            next.run(request).await
        });

        let request = UnaryRequest::new("/svc/Echo", Bytes::from_static(b"original"));
        let outcome = rewrite.intercept(request, echo_handler).await;
        assert_eq!(outcome.unwrap(), Bytes::from_static(b"rewritten"));
    }

    #[tokio::test]
    async fn test_interceptor_can_short_circuit() {
        let deny = UnaryInterceptor::new(|_request, _next: UnaryNext| async {
            Err(RpcError::new(7, "permission denied"))
        });

        let request = UnaryRequest::new("/svc/Echo", Bytes::new());
        let outcome = deny
            .intercept(request, |_req| async { panic!("handler must not run") })
            .await;

        let err = outcome.unwrap_err();
        assert_eq!(err.code, 7);
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_interceptor_observes_handler_error() {
        let seen = Arc::new(Mutex::new(None));
        let observer = {
            let seen = Arc::clone(&seen);
            UnaryInterceptor::new(move |request, next: UnaryNext| {
                let seen = Arc::clone(&seen);
                async move {
                    let outcome = next.run(request).await;
                    if let Err(err) = &outcome {
                        *seen.lock().unwrap() = Some(err.clone());
                    }
                    outcome
                }
            })
        };

        let request = UnaryRequest::new("/svc/Fail", Bytes::new());
        let outcome = observer
            .intercept(request, |_req| async {
                Err(RpcError::internal("handler blew up"))
            })
            .await;

        assert!(outcome.is_err());
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().code, 13);
    }
}
