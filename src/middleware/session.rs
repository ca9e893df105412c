//! Session context middleware.
//!
//! [`SessionLayer`] composes an external [`SessionStorage`] with the
//! pipeline: it creates the storage handle once per request, parks it in the
//! request context, and — when auto-commit is on — materializes the
//! [`Session`] from the `cookie` header on the way in and appends the
//! committed `set-cookie` header on the way out. It never looks inside the
//! session; it is a conduit.
//!
//! Keys are per-instance: a layer mints its own [`Key`]s at construction and
//! exposes them via [`session_key`](SessionLayer::session_key) /
//! [`storage_key`](SessionLayer::storage_key), so two session layers with
//! different backends can sit on one pipeline without clobbering each other.
//!
//! ```rust,no_run
//! use torii::middleware::session::{get_session, SessionLayer};
//! use torii::{Context, MemoryStorage, Response, Router};
//!
//! let store = MemoryStorage::new();
//! let sessions = SessionLayer::new(move |_ctx: &Context| Ok(store.clone()))
//!     .auto_commit(true);
//! let session_key = sessions.session_key();
//!
//! let app = Router::new().with(sessions).get("/", move |ctx: Context| async move {
//!     let session = get_session(&ctx, session_key).expect("session layer installed");
//!     session.set("seen", true);
//!     Response::text("hello")
//! });
//! ```

use std::sync::Arc;

use crate::context::{Context, Key};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::response::Response;
use crate::session::{Session, SessionStorage};

// ── SessionLayer ─────────────────────────────────────────────────────────────

/// Session middleware. See the [module docs](self).
pub struct SessionLayer<S, F> {
    create_storage: F,
    auto_commit: bool,
    storage_key: Key<Arc<S>>,
    session_key: Key<Session>,
}

impl<S, F> SessionLayer<S, F>
where
    S: SessionStorage,
    F: Fn(&Context) -> Result<S, Error> + Send + Sync + 'static,
{
    /// A session layer over `create_storage`, which is invoked exactly once
    /// per request to obtain the storage handle. An `Err` from it is a fatal
    /// misconfiguration: it propagates uncaught to the pipeline error
    /// boundary rather than being retried or swallowed.
    ///
    /// Auto-commit starts disabled — only the storage handle is made
    /// available and the session itself is never read.
    pub fn new(create_storage: F) -> Self {
        Self {
            create_storage,
            auto_commit: false,
            storage_key: Key::new(),
            session_key: Key::new(),
        }
    }

    /// With auto-commit on, the layer reads the session before the chain
    /// runs and appends the committed `set-cookie` header after it returns.
    pub fn auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    /// The key under which this layer parks the [`Session`]. Only written
    /// when auto-commit is on.
    pub fn session_key(&self) -> Key<Session> {
        self.session_key
    }

    /// The key under which this layer parks the storage handle.
    pub fn storage_key(&self) -> Key<Arc<S>> {
        self.storage_key
    }
}

impl<S, F> Middleware for SessionLayer<S, F>
where
    S: SessionStorage,
    F: Fn(&Context) -> Result<S, Error> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let storage = Arc::new((self.create_storage)(&ctx)?);
            ctx.set(self.storage_key, Arc::clone(&storage));

            // Without auto-commit the storage handle is all downstream code
            // gets; the chain's response passes through untouched.
            if !self.auto_commit {
                return next.run(ctx).await;
            }

            let session = storage.get_session(ctx.request().header("cookie")).await?;
            ctx.set(self.session_key, session.clone());

            // A downstream Err skips the commit entirely.
            let mut response = next.run(ctx).await?;

            let cookie = storage.commit_session(&session).await?;
            response.append_header("set-cookie", &cookie);
            Ok(response)
        })
    }
}

// ── Accessors ────────────────────────────────────────────────────────────────

/// The session parked by the [`SessionLayer`] owning `key`.
///
/// Fails with [`Error::MiddlewareMissing`] when no layer wrote the slot —
/// the middleware is not installed upstream, or auto-commit is off. An
/// empty session is *not* an error.
pub fn get_session(ctx: &Context, key: Key<Session>) -> Result<Session, Error> {
    ctx.require(key, "session")
}

/// The storage handle parked by the [`SessionLayer`] owning `key`.
///
/// Fails with [`Error::MiddlewareMissing`] when the layer is not installed
/// upstream of the call site.
pub fn get_session_storage<S: SessionStorage>(
    ctx: &Context,
    key: Key<Arc<S>>,
) -> Result<Arc<S>, Error> {
    ctx.require(key, "session")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use http::StatusCode;
    use serde_json::Value;

    use super::*;
    use crate::middleware::from_fn;
    use crate::request::Request;
    use crate::router::Router;
    use crate::session::MemoryStorage;

    fn layer_over(store: &MemoryStorage) -> SessionLayer<MemoryStorage, impl Fn(&Context) -> Result<MemoryStorage, Error> + Send + Sync + 'static> {
        let store = store.clone();
        SessionLayer::new(move |_ctx: &Context| Ok(store.clone()))
    }

    #[tokio::test]
    async fn without_auto_commit_no_session_and_no_cookie() {
        let store = MemoryStorage::new();
        let layer = layer_over(&store);
        let storage_key = layer.storage_key();
        let session_key = layer.session_key();

        let app = Router::new()
            .with(layer)
            .get("/", move |ctx: Context| async move {
                assert!(get_session_storage(&ctx, storage_key).is_ok());
                assert!(matches!(
                    get_session(&ctx, session_key),
                    Err(Error::MiddlewareMissing("session"))
                ));
                Response::text("ok")
            });

        let res = app.handle(Request::builder().uri("/").build()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"ok");
        assert!(res.header("set-cookie").is_none());
    }

    #[tokio::test]
    async fn auto_commit_appends_exactly_one_cookie() {
        let store = MemoryStorage::new();
        let layer = layer_over(&store).auto_commit(true);
        let session_key = layer.session_key();

        let app = Router::new()
            .with(layer)
            .get("/", move |ctx: Context| async move {
                get_session(&ctx, session_key).unwrap().set("user", "alice");
                Response::text("ok")
            });

        let res = app.handle(Request::builder().uri("/").build()).await;

        let cookies: Vec<_> = res
            .headers()
            .iter()
            .filter(|(n, _)| n == "set-cookie")
            .map(|(_, v)| v.clone())
            .collect();
        assert_eq!(cookies, vec!["session=s0; Path=/; HttpOnly".to_owned()]);

        // The handler's mutation made it into the committed record.
        assert_eq!(
            store.record("s0").unwrap().get("user"),
            Some(&Value::from("alice"))
        );
    }

    #[tokio::test]
    async fn auto_commit_resumes_session_from_request_cookie() {
        let store = MemoryStorage::new();

        // Seed a record the way a previous request would have.
        let seeded = store.get_session(None).await.unwrap();
        seeded.set("count", 1);
        let cookie = store.commit_session(&seeded).await.unwrap();

        let layer = layer_over(&store).auto_commit(true);
        let session_key = layer.session_key();

        let app = Router::new()
            .with(layer)
            .get("/", move |ctx: Context| async move {
                let session = get_session(&ctx, session_key).unwrap();
                assert_eq!(session.get("count"), Some(Value::from(1)));
                session.set("count", 2);
                Response::text("ok")
            });

        let res = app
            .handle(Request::builder().uri("/").header("cookie", &cookie).build())
            .await;

        assert_eq!(res.header("set-cookie"), Some(cookie.as_str()));
        assert_eq!(
            store.record(&seeded.id()).unwrap().get("count"),
            Some(&Value::from(2))
        );
    }

    #[tokio::test]
    async fn accessors_fail_without_the_middleware() {
        let key = Key::<Session>::new();
        let app = Router::new().get("/", move |ctx: Context| async move {
            match get_session(&ctx, key) {
                Err(Error::MiddlewareMissing("session")) => Response::text("missing"),
                _ => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
            }
        });

        let res = app.handle(Request::builder().uri("/").build()).await;
        assert_eq!(res.body(), b"missing");
    }

    #[tokio::test]
    async fn create_storage_failure_propagates_and_skips_the_handler() {
        let reached = Arc::new(AtomicBool::new(false));
        let layer = SessionLayer::new(|_ctx: &Context| -> Result<MemoryStorage, Error> {
            Err(Error::Config("session secret is not set".into()))
        });

        let flag = Arc::clone(&reached);
        let app = Router::new()
            .with(layer)
            .get("/", move |_ctx: Context| {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Response::text("ok")
                }
            });

        let res = app.handle(Request::builder().uri("/").build()).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!reached.load(Ordering::SeqCst));
        assert!(res.header("set-cookie").is_none());
    }

    #[tokio::test]
    async fn downstream_error_skips_the_commit() {
        let store = MemoryStorage::new();
        let layer = layer_over(&store).auto_commit(true);

        let app = Router::new()
            .with(layer)
            .with(from_fn(|_ctx, _next| {
                Box::pin(async { Err(Error::Config("downstream failure".into())) })
            }))
            .get("/", |_ctx: Context| async { Response::text("unreached") });

        let res = app.handle(Request::builder().uri("/").build()).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.header("set-cookie").is_none());
        assert!(store.record("s0").is_none());
    }

    #[tokio::test]
    async fn two_layers_keep_independent_state() {
        let store_a = MemoryStorage::new();
        let store_b = MemoryStorage::new();
        let layer_a = layer_over(&store_a).auto_commit(true);
        let layer_b = layer_over(&store_b).auto_commit(true);
        let key_a = layer_a.session_key();
        let key_b = layer_b.session_key();

        let app = Router::new()
            .with(layer_a)
            .with(layer_b)
            .get("/", move |ctx: Context| async move {
                get_session(&ctx, key_a).unwrap().set("backend", "a");
                get_session(&ctx, key_b).unwrap().set("backend", "b");
                Response::text("ok")
            });

        let res = app.handle(Request::builder().uri("/").build()).await;

        let cookie_count = res
            .headers()
            .iter()
            .filter(|(n, _)| n == "set-cookie")
            .count();
        assert_eq!(cookie_count, 2);
        assert_eq!(
            store_a.record("s0").unwrap().get("backend"),
            Some(&Value::from("a"))
        );
        assert_eq!(
            store_b.record("s0").unwrap().get("backend"),
            Some(&Value::from("b"))
        );
    }
}
