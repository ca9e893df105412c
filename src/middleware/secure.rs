//! HTTPS enforcement.

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::response::Response;

/// Redirects plain-`http` requests to the same URL under `https`.
///
/// One deterministic rewrite, no retries. Schemes other than `http` pass
/// through — the proxy in front of the server decides what "secure" means
/// for anything else.
///
/// Behind a reverse proxy the scheme comes from `x-forwarded-proto` (see
/// [`Request::scheme`](crate::Request::scheme)), so this works whether TLS
/// terminates here or at the edge.
pub struct HttpsOnly;

impl Middleware for HttpsOnly {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let request = ctx.request();
            if request.scheme() != "http" {
                return next.run(ctx).await;
            }

            let pq = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            let target = format!("https://{}{}", request.authority(), pq);
            Ok(Response::redirect(&target))
        })
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::request::Request;
    use crate::router::Router;

    fn app() -> Router {
        Router::new()
            .with(HttpsOnly)
            .get("/x", |_ctx: Context| async { Response::text("reached") })
    }

    #[tokio::test]
    async fn http_redirects_to_https() {
        let res = app()
            .handle(Request::builder().uri("http://example.com/x").build())
            .await;
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.header("location"), Some("https://example.com/x"));
    }

    #[tokio::test]
    async fn https_passes_through() {
        let res = app()
            .handle(Request::builder().uri("https://example.com/x").build())
            .await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"reached");
    }

    #[tokio::test]
    async fn forwarded_proto_counts_as_https() {
        let res = app()
            .handle(
                Request::builder()
                    .uri("/x")
                    .header("host", "example.com")
                    .header("x-forwarded-proto", "https")
                    .build(),
            )
            .await;
        assert_eq!(res.body(), b"reached");
    }
}
