//! Terminal adapter for a server-rendering application.
//!
//! The rendering framework stays external: it exposes one entry point that
//! turns a request plus an application-defined load context into a
//! response. [`Render`] is the glue that sits at the end of the pipeline,
//! builds the load context from whatever upstream middleware put in the
//! request [`Context`], and forwards.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The server-rendering capability [`Render`] forwards to.
///
/// `C` is the application's load context — the bag of per-request values
/// (session accessors, config, bindings) the app's loaders and actions see.
pub trait RenderHandler<C>: Send + Sync + 'static {
    fn render(
        &self,
        request: &Request,
        load_context: C,
    ) -> impl Future<Output = Result<Response, Error>> + Send;
}

/// Terminal middleware hosting a server-rendered app. Never calls `next` —
/// everything that reaches it is answered by the app, including its 404s.
///
/// Mount it last:
///
/// ```text
/// Router::new()
///     .with(HttpsOnly)
///     .with(sessions)
///     .with(Render::new(app, move |ctx| …build load context…))
/// ```
pub struct Render<H, C, F> {
    handler: Arc<H>,
    get_load_context: F,
    _marker: PhantomData<fn() -> C>,
}

impl<H, C, F> Render<H, C, F>
where
    H: RenderHandler<C>,
    C: Send + 'static,
    F: Fn(&Context) -> C + Send + Sync + 'static,
{
    /// `get_load_context` runs once per request, before the app renders.
    pub fn new(handler: H, get_load_context: F) -> Self {
        Self {
            handler: Arc::new(handler),
            get_load_context,
            _marker: PhantomData,
        }
    }
}

impl<H, C, F> Middleware for Render<H, C, F>
where
    H: RenderHandler<C>,
    C: Send + 'static,
    F: Fn(&Context) -> C + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, ctx: Context, _next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let load_context = (self.get_load_context)(&ctx);
            self.handler.render(ctx.request(), load_context).await
        })
    }
}
