//! Trailing-slash normalization.

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::response::Response;

/// Enforces or strips a trailing slash on the URL path, for canonical URLs.
///
/// [`enforce`](TrailingSlash::enforce) redirects `/a` to `/a/`;
/// [`strip`](TrailingSlash::strip) redirects `/a/` to `/a`. The root path
/// `/` is never stripped — there is no shorter canonical form. Requests
/// already in canonical form pass through; redirects preserve the query
/// string.
pub struct TrailingSlash {
    enabled: bool,
}

impl TrailingSlash {
    /// Canonical form has a trailing slash.
    pub fn enforce() -> Self {
        Self { enabled: true }
    }

    /// Canonical form has no trailing slash (except the root).
    pub fn strip() -> Self {
        Self { enabled: false }
    }
}

impl Default for TrailingSlash {
    fn default() -> Self {
        Self::strip()
    }
}

impl Middleware for TrailingSlash {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let request = ctx.request();
            let path = request.path();
            let has_slash = path.ends_with('/');

            let canonical = if self.enabled && !has_slash {
                Some(format!("{path}/"))
            } else if !self.enabled && has_slash && path != "/" {
                Some(path[..path.len() - 1].to_owned())
            } else {
                None
            };

            match canonical {
                Some(new_path) => {
                    let query = request
                        .query()
                        .map(|q| format!("?{q}"))
                        .unwrap_or_default();
                    let target = format!(
                        "{}://{}{}{}",
                        request.scheme(),
                        request.authority(),
                        new_path,
                        query
                    );
                    Ok(Response::redirect(&target))
                }
                None => next.run(ctx).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::request::Request;
    use crate::router::Router;

    fn app(layer: TrailingSlash) -> Router {
        Router::new()
            .with(layer)
            .get("/a", |_ctx: Context| async { Response::text("plain") })
            .get("/a/", |_ctx: Context| async { Response::text("slashed") })
            .get("/", |_ctx: Context| async { Response::text("root") })
    }

    #[tokio::test]
    async fn enforce_adds_missing_slash() {
        let res = app(TrailingSlash::enforce())
            .handle(Request::builder().uri("https://example.com/a").build())
            .await;
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.header("location"), Some("https://example.com/a/"));
    }

    #[tokio::test]
    async fn enforce_passes_through_when_already_slashed() {
        let res = app(TrailingSlash::enforce())
            .handle(Request::builder().uri("https://example.com/a/").build())
            .await;
        assert_eq!(res.body(), b"slashed");
    }

    #[tokio::test]
    async fn strip_removes_trailing_slash() {
        let res = app(TrailingSlash::strip())
            .handle(Request::builder().uri("https://example.com/a/").build())
            .await;
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.header("location"), Some("https://example.com/a"));
    }

    #[tokio::test]
    async fn strip_never_touches_the_root() {
        let res = app(TrailingSlash::strip())
            .handle(Request::builder().uri("https://example.com/").build())
            .await;
        assert_eq!(res.body(), b"root");
    }

    #[tokio::test]
    async fn strip_passes_through_without_slash() {
        let res = app(TrailingSlash::strip())
            .handle(Request::builder().uri("https://example.com/a").build())
            .await;
        assert_eq!(res.body(), b"plain");
    }

    #[tokio::test]
    async fn redirect_preserves_the_query_string() {
        let res = app(TrailingSlash::strip())
            .handle(Request::builder().uri("https://example.com/a/?page=2").build())
            .await;
        assert_eq!(res.header("location"), Some("https://example.com/a?page=2"));
    }
}
