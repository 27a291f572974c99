//! Path-based request routing with prefix mounts.
//!
//! A [`Router`] owns three tables: exact-path handlers, sub-routers mounted
//! at path prefixes, and wrapping middlewares. Dispatch resolves in that
//! order: middlewares run around everything, an exact handler match beats
//! any mount, and among mounts the longest matching prefix wins. Unmatched
//! requests get a JSON 404.
//!
//! Paths are compared after trimming trailing slashes (`/users/` and
//! `/users` are the same route); `/` is mountable as the catch-all prefix.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};

/// A boxed future produced by route handlers.
pub type HandlerFuture = BoxFuture<'static, Response>;

/// A shared route handler.
pub type HandlerFn = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// HTTP request router.
///
/// Cheap to clone: handlers and middlewares are shared, mounted sub-routers
/// are cloned structurally.
///
/// # Example
///
/// ```
/// use stoa_router::{Request, Response, ResponseExt, Router};
/// use http::StatusCode;
///
/// let mut users = Router::new();
/// users.handle_fn("/list", |_req: Request| async {
///     Response::error(StatusCode::OK, "alice,bob")
/// });
///
/// let mut root = Router::new();
/// root.mount("/users", users);
/// assert_eq!(root.mount_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Router {
    /// Exact-path handlers, first registration wins.
    routes: Vec<(String, HandlerFn)>,

    /// Sub-routers by path prefix.
    mounts: Vec<(String, Router)>,

    /// Wrapping middlewares, first added runs outermost.
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shared handler at an exact path.
    ///
    /// Paths are matched verbatim after trailing-slash trimming. If the
    /// same path is registered twice, the first registration wins.
    pub fn handle(&mut self, path: impl AsRef<str>, handler: HandlerFn) {
        self.routes.push((canonical(path.as_ref()), handler));
    }

    /// Registers an async closure at an exact path.
    pub fn handle_fn<F, Fut>(&mut self, path: impl AsRef<str>, f: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Response> + Send + 'static,
    {
        self.handle(path, Arc::new(move |request| Box::pin(f(request))));
    }

    /// Mounts a sub-router at a path prefix.
    ///
    /// The prefix is stripped before the sub-router sees the request; a
    /// request for exactly the prefix reaches the sub-router as `/`. The
    /// prefix `/` mounts the sub-router over every path.
    pub fn mount(&mut self, prefix: impl AsRef<str>, router: Router) {
        self.mounts.push((canonical(prefix.as_ref()), router));
    }

    /// Adds a wrapping middleware. The first added runs outermost.
    pub fn wrap<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Adds an already-shared wrapping middleware.
    pub fn wrap_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Returns the number of exact-path handlers registered on this router.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns the number of mounted sub-routers.
    #[must_use]
    pub fn mount_count(&self) -> usize {
        self.mounts.len()
    }

    /// Returns `true` if an exact handler is registered for `path`.
    #[must_use]
    pub fn has_route(&self, path: &str) -> bool {
        let wanted = canonical(path);
        self.routes.iter().any(|(p, _)| *p == wanted)
    }

    /// Dispatches a request through the middleware chain to a handler.
    ///
    /// Resolution order: exact handler match, then the mount with the
    /// longest matching prefix (ties broken by insertion order), then a
    /// JSON 404.
    pub async fn dispatch(&self, request: Request) -> Response {
        let terminal = Next::dispatch(|req| self.route(req));
        let chain = self
            .middlewares
            .iter()
            .rev()
            .fold(terminal, |next, middleware| {
                Next::chain(middleware.as_ref(), next)
            });
        chain.run(request).await
    }

    /// Routes past the middleware chain. Boxed because mounts recurse.
    fn route<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();
            let exact = normalize(&path);

            if let Some((_, handler)) = self.routes.iter().find(|(p, _)| *p == exact) {
                return handler(request).await;
            }

            let mut best: Option<(&Router, &str)> = None;
            let mut best_len = 0;
            for (prefix, sub) in &self.mounts {
                if let Some(rest) = mount_remainder(prefix, &path) {
                    // Longest prefix wins, insertion order breaks ties.
                    if prefix.len() > best_len {
                        best = Some((sub, rest));
                        best_len = prefix.len();
                    }
                }
            }
            if let Some((sub, rest)) = best {
                return sub.dispatch(with_path(request, rest)).await;
            }

            Response::json_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("no handler for {path}"),
            )
        })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field(
                "routes",
                &self.routes.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            )
            .field(
                "mounts",
                &self.mounts.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            )
            .field(
                "middlewares",
                &self
                    .middlewares
                    .iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Trims trailing slashes; the bare root stays `/`.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Normalizes a registration path to owned, leading-slash form.
fn canonical(path: &str) -> String {
    let normalized = normalize(path);
    if normalized.starts_with('/') {
        normalized.to_string()
    } else {
        format!("/{normalized}")
    }
}

/// Returns the sub-router path for `path` under `prefix`, if it matches.
fn mount_remainder<'p>(prefix: &str, path: &'p str) -> Option<&'p str> {
    if prefix == "/" {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        // Prefix ended mid-segment, e.g. "/api" against "/apix".
        None
    }
}

/// Replaces the request path, keeping the query string.
fn with_path(request: Request, path: &str) -> Request {
    let (mut parts, body) = request.into_parts();
    let target = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    if let Ok(uri) = http::Uri::try_from(target) {
        parts.uri = uri;
    }
    Request::from_parts(parts, body)
}
