//! Minimal torii example — a session-backed visit counter behind the
//! full middleware stack.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -v http://localhost:3000/                 # counts visits per cookie
//!   curl -v http://localhost:3000/marketing/       # redirected to /marketing
//!   curl -v -c jar.txt -b jar.txt http://localhost:3000/

use serde::Deserialize;
use torii::middleware::session::{get_session, SessionLayer};
use torii::middleware::trailing_slash::TrailingSlash;
use torii::{typed_env, Context, MemoryStorage, Response, Router, Server};

#[derive(Deserialize)]
struct Env {
    #[serde(rename = "PORT")]
    port: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let env: Env = typed_env().expect("environment matches schema");
    let addr = format!("0.0.0.0:{}", env.port.as_deref().unwrap_or("3000"));

    let store = MemoryStorage::new();
    let sessions = SessionLayer::new(move |_ctx: &Context| Ok(store.clone()))
        .auto_commit(true);
    let session_key = sessions.session_key();

    let app = Router::new()
        .with(TrailingSlash::strip())
        .with(sessions)
        .get("/", move |ctx: Context| async move {
            let session = get_session(&ctx, session_key).expect("session layer installed");
            let visits = session
                .get("visits")
                .and_then(|v| v.as_i64())
                .unwrap_or(0)
                + 1;
            session.set("visits", visits);
            Response::json(format!(r#"{{"visits":{visits}}}"#).into_bytes())
        })
        .get("/marketing", |_ctx: Context| async {
            Response::text("canonical, slashless")
        });

    Server::bind(&addr).serve(app).await.expect("server error");
}
