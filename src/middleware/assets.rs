//! Static-asset passthrough.

use std::sync::Arc;

use tracing::warn;

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The asset-serving capability [`StaticAssets`] forwards to — a CDN
/// client, an object-store fetch, a build-output directory reader.
pub trait AssetServer: Send + Sync + 'static {
    fn fetch(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<Response, Error>> + Send;
}

/// Serves a request from an [`AssetServer`], falling through to the rest of
/// the chain when the asset origin can't.
///
/// A 4xx/5xx status or a failed fetch is not an error here — the request
/// simply isn't for an asset, and the app behind `next` gets its turn. The
/// fetched error response is discarded. Successful responses are returned
/// as-is, optionally with the `cache-control` header rewritten to the
/// configured value.
pub struct StaticAssets<A> {
    server: Arc<A>,
    cache_control: Option<String>,
}

impl<A: AssetServer> StaticAssets<A> {
    pub fn new(server: A) -> Self {
        Self { server: Arc::new(server), cache_control: None }
    }

    /// Rewrite `cache-control` on every asset response — build outputs with
    /// hashed filenames usually want something long-lived here.
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }
}

impl<A: AssetServer> Middleware for StaticAssets<A> {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            match self.server.fetch(ctx.request()).await {
                Ok(mut response)
                    if !response.status_code().is_client_error()
                        && !response.status_code().is_server_error() =>
                {
                    if let Some(value) = &self.cache_control {
                        response.set_header("cache-control", value);
                    }
                    Ok(response)
                }
                Ok(_) => next.run(ctx).await,
                Err(err) => {
                    warn!("asset fetch failed, falling through: {err}");
                    next.run(ctx).await
                }
            }
        })
    }
}
