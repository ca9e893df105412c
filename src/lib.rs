//! # torii
//!
//! Middleware for hosting server-rendered web apps on a minimal HTTP
//! framework. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! The hard parts of a web stack — rendering, session persistence, cookie
//! signing, locale negotiation — belong to the libraries that already do
//! them well. torii does not reimplement any of it. Every middleware here
//! is a thin, predictable conduit between the request pipeline and an
//! external capability, and the pipeline itself stays small enough to read
//! in one sitting:
//!
//! - **Session context** — per-request storage handle + session, optional
//!   auto-commit to `set-cookie` ([`middleware::session`])
//! - **HTTPS enforcement** — one deterministic redirect ([`middleware::secure`])
//! - **Trailing-slash normalization** — canonical URLs for SEO
//!   ([`middleware::trailing_slash`])
//! - **Static-asset passthrough** — asset origin first, app second
//!   ([`middleware::assets`])
//! - **Locale context** — resolver, locale and translator per request
//!   ([`middleware::i18n`])
//! - **App adapter** — terminal hook for the rendering framework
//!   ([`middleware::render`])
//! - **Typed environment** — serde-validated config access ([`typed_env`])
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use torii::middleware::secure::HttpsOnly;
//! use torii::middleware::session::{get_session, SessionLayer};
//! use torii::{Context, MemoryStorage, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStorage::new();
//!     let sessions = SessionLayer::new(move |_ctx: &Context| Ok(store.clone()))
//!         .auto_commit(true);
//!     let session_key = sessions.session_key();
//!
//!     let app = Router::new()
//!         .with(HttpsOnly)
//!         .with(sessions)
//!         .get("/", move |ctx: Context| async move {
//!             let session = get_session(&ctx, session_key).expect("session layer installed");
//!             session.set("visited", true);
//!             Response::text("hello")
//!         });
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//! ```
//!
//! ## Keys, not strings
//!
//! Middleware state lives in the per-request [`Context`] under opaque
//! [`Key`]s minted at middleware construction time. Accessors fail loudly
//! ([`Error::MiddlewareMissing`]) when their middleware is not installed —
//! never a silent `None` that reads like an empty session.

mod context;
mod env;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod session;

pub mod middleware;

pub use context::{Context, Key};
pub use env::{typed_env, typed_env_from};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use session::{MemoryStorage, Session, SessionStorage};

// The `http` types are part of this crate's public API surface.
pub use http::{Method, StatusCode};
