//! Full-pipeline integration tests: several middlewares composed on one
//! router, driven the way the server drives it.

use http::StatusCode;
use serde_json::Value;
use torii::middleware::secure::HttpsOnly;
use torii::middleware::session::{get_session, SessionLayer};
use torii::middleware::trailing_slash::TrailingSlash;
use torii::{Context, MemoryStorage, Request, Response, Router, SessionStorage};

fn session_app(store: &MemoryStorage) -> Router {
    let sessions = {
        let store = store.clone();
        SessionLayer::new(move |_ctx: &Context| Ok(store.clone())).auto_commit(true)
    };
    let session_key = sessions.session_key();

    Router::new()
        .with(HttpsOnly)
        .with(TrailingSlash::strip())
        .with(sessions)
        .get("/profile", move |ctx: Context| async move {
            let session = get_session(&ctx, session_key).expect("session layer installed");
            let name = session
                .get("name")
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_else(|| "anonymous".to_owned());
            session.set("seen", true);
            Response::text(name)
        })
}

#[tokio::test]
async fn outer_middleware_short_circuits_before_the_session_runs() {
    let store = MemoryStorage::new();
    let app = session_app(&store);

    // Plain http: HttpsOnly answers before the session layer ever runs, so
    // no cookie is committed.
    let res = app
        .handle(Request::builder().uri("http://example.com/profile").build())
        .await;
    assert_eq!(res.status_code(), StatusCode::FOUND);
    assert_eq!(res.header("location"), Some("https://example.com/profile"));
    assert!(res.header("set-cookie").is_none());
    assert!(store.record("s0").is_none());
}

#[tokio::test]
async fn normalization_still_runs_for_unrouted_paths() {
    let store = MemoryStorage::new();
    let app = session_app(&store);

    // `/profile/` matches no route, but the middleware chain wraps the
    // fallback too, so the slash middleware fixes the URL instead of a 404.
    let res = app
        .handle(Request::builder().uri("https://example.com/profile/").build())
        .await;
    assert_eq!(res.status_code(), StatusCode::FOUND);
    assert_eq!(res.header("location"), Some("https://example.com/profile"));
}

#[tokio::test]
async fn session_survives_across_requests_via_the_cookie() {
    let store = MemoryStorage::new();
    let app = session_app(&store);

    let first = app
        .handle(Request::builder().uri("https://example.com/profile").build())
        .await;
    assert_eq!(first.body(), b"anonymous");
    let cookie = first.header("set-cookie").expect("cookie committed").to_owned();

    // Simulate the application having stored a name in this client's record.
    let id = store
        .record("s0")
        .map(|_| "s0".to_owned())
        .expect("record committed");
    let session = store.get_session(Some(&cookie)).await.unwrap();
    session.set("name", "alice");
    store.commit_session(&session).await.unwrap();

    let second = app
        .handle(
            Request::builder()
                .uri("https://example.com/profile")
                .header("cookie", &cookie)
                .build(),
        )
        .await;
    assert_eq!(second.body(), b"alice");
    assert_eq!(
        store.record(&id).unwrap().get("seen"),
        Some(&Value::from(true))
    );
}

#[tokio::test]
async fn fallback_responses_still_get_the_session_cookie() {
    let store = MemoryStorage::new();
    let app = session_app(&store);

    // Routable in form (no trailing slash, https) but unknown path: the 404
    // passes back through the session layer, which still auto-commits.
    let res = app
        .handle(Request::builder().uri("https://example.com/nope").build())
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(res.header("set-cookie").is_some());
}
