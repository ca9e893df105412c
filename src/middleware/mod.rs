//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: session context, HTTPS enforcement, URL
//! normalization, static-asset passthrough, locale resolution.
//!
//! # The pipeline
//!
//! A middleware receives the request [`Context`] and a [`Next`] cursor over
//! the rest of the chain. It can answer directly (redirects, asset hits),
//! run the chain and return its response untouched, or run the chain and
//! amend the response afterwards (session auto-commit). The chain terminates
//! at the matched route handler — or the router's fallback, so middleware
//! still runs for unrouted paths.
//!
//! ```text
//! request ──▶ mw[0] ──▶ mw[1] ──▶ … ──▶ handler
//!                ◀─────────◀── response ──┘
//! ```
//!
//! # Errors
//!
//! The chain is fallible: an `Err` from any middleware skips everything
//! downstream of the failure point on the way up and lands at the pipeline
//! error boundary in [`Router::handle`](crate::Router::handle), which logs
//! and answers 500. Middleware never retries.
//!
//! Built-in middleware:
//! - [`session::SessionLayer`] — request-scoped session context, optional auto-commit
//! - [`secure::HttpsOnly`] — redirect plain-http requests to https
//! - [`trailing_slash::TrailingSlash`] — enforce or strip trailing slashes
//! - [`assets::StaticAssets`] — asset passthrough with local fallthrough
//! - [`i18n::I18n`] — locale and translator context
//! - [`render::Render`] — terminal adapter for a server-rendering app

pub mod assets;
pub mod i18n;
pub mod render;
pub mod secure;
pub mod session;
pub mod trailing_slash;

use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::response::Response;

// ── Middleware trait ──────────────────────────────────────────────────────────

/// A step in the request-processing pipeline.
///
/// Stored type-erased (`Arc<dyn Middleware>`) in the router, same scheme as
/// handlers: one Arc clone and one virtual call per request per middleware.
pub trait Middleware: Send + Sync + 'static {
    /// Processes one request. Call `next.run(ctx)` to continue the chain;
    /// return without calling it to short-circuit.
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>>;
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// Cursor over the remainder of the middleware chain, ending at the route
/// handler.
///
/// Owns its position, so it can be moved into the boxed futures middleware
/// returns. Consumed by [`run`](Next::run) — a middleware can invoke the
/// rest of the chain at most once.
pub struct Next {
    stack: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[Arc<dyn Middleware>]>, handler: BoxedHandler) -> Self {
        Self { stack, index: 0, handler }
    }

    /// Runs the rest of the chain to completion and returns its response.
    pub fn run(mut self, ctx: Context) -> BoxFuture<'static, Result<Response, Error>> {
        match self.stack.get(self.index).cloned() {
            Some(middleware) => {
                self.index += 1;
                Box::pin(async move { middleware.handle(ctx, self).await })
            }
            None => {
                let handler = Arc::clone(&self.handler);
                Box::pin(async move { Ok(handler.call(ctx).await) })
            }
        }
    }
}

// ── Function adapter ──────────────────────────────────────────────────────────

/// Wraps a closure as a [`Middleware`].
///
/// ```rust
/// use torii::middleware::from_fn;
///
/// let logged = from_fn(|ctx, next| {
///     Box::pin(async move {
///         tracing::info!(path = ctx.request().path(), "request");
///         next.run(ctx).await
///     })
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(Context, Next) -> BoxFuture<'static, Result<Response, Error>>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware(f)
}

/// See [`from_fn`].
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Context, Next) -> BoxFuture<'static, Result<Response, Error>>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        (self.0)(ctx, next)
    }
}
