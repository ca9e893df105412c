//! Radix-tree request router and the middleware pipeline around it.
//!
//! One tree per HTTP method, O(path-length) lookup. Middleware registered
//! with [`Router::with`] wraps every route *and* the fallback — an unrouted
//! path still gets its redirects, sessions and locale resolved, which is
//! what lets a normalization middleware fix `/a/` into a routable `/a`.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::error;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration method returns `self` so calls chain naturally.
/// Middleware runs in registration order, outermost first.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Arc<[Arc<dyn Middleware>]>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Vec::new().into(),
            fallback: not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `ctx.request().param("name")`
    /// retrieves them:
    ///
    /// ```rust,no_run
    /// # use http::Method;
    /// # use torii::{Context, Response, Router};
    /// # async fn get_user(_: Context) -> Response { Response::text("") }
    /// # async fn create_user(_: Context) -> Response { Response::text("") }
    /// # async fn delete_user(_: Context) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::DELETE, "/users/{id}", delete_user)
    ///     .on(Method::GET,    "/users/{id}", get_user)
    ///     .on(Method::POST,   "/users",      create_user);
    /// ```
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler)
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.add(Method::DELETE, path, handler)
    }

    /// Appends a middleware to the pipeline. Runs for every request, in
    /// registration order, around the matched handler or the fallback.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        let mut stack: Vec<Arc<dyn Middleware>> = self.middleware.to_vec();
        stack.push(Arc::new(middleware));
        self.middleware = stack.into();
        self
    }

    /// Replaces the handler for requests no route matches (default: bare 404).
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = handler.into_boxed_handler();
        self
    }

    fn add(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Routes one request through the middleware pipeline to a handler and
    /// produces the response.
    ///
    /// This is the whole request lifecycle minus the socket: the server
    /// calls it per request, and tests drive the router through it directly.
    /// An `Err` escaping the pipeline is logged and answered with 500 — the
    /// error boundary for misconfigured middleware and storage failures.
    pub async fn handle(&self, mut request: Request) -> Response {
        let handler = match self.lookup(request.method(), request.path()) {
            Some((handler, params)) => {
                request.params = params;
                handler
            }
            None => Arc::clone(&self.fallback),
        };

        let ctx = Context::new(request);
        let next = Next::new(Arc::clone(&self.middleware), handler);

        match next.run(ctx).await {
            Ok(response) => response,
            Err(err) => {
                error!("request failed: {err}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_ctx: Context) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}
