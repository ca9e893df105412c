//! Session data and the storage capability it comes from.
//!
//! A [`Session`] is mutable key-value data tied to one client. How it
//! persists — signed cookie, KV namespace, database — is the business of a
//! [`SessionStorage`] implementation, not of this crate: the session
//! middleware only moves sessions between the `cookie` request header and
//! the `set-cookie` response header through that capability.
//!
//! # Sharing model
//!
//! `Session` is a shared handle: clones see the same data. The middleware
//! materializes one per request, parks a clone in the request context, and
//! commits *the same object* after the downstream chain has mutated it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::Error;

// ── Session ──────────────────────────────────────────────────────────────────

/// Mutable per-client key-value data.
///
/// Values are [`serde_json::Value`] so applications can store anything that
/// serializes. An empty session is a valid session — emptiness is
/// application state, not an error.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

struct SessionInner {
    id: String,
    data: HashMap<String, Value>,
}

impl Session {
    /// A session with the given id and initial data. Called by storage
    /// implementations; application code receives sessions from the
    /// middleware accessors.
    pub fn new(id: impl Into<String>, data: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner { id: id.into(), data })),
        }
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().data.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().data.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.lock().data.remove(key);
    }

    pub fn has(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    /// Snapshot of the current data.
    pub fn data(&self) -> HashMap<String, Value> {
        self.lock().data.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("session poisoned")
    }
}

// ── SessionStorage ───────────────────────────────────────────────────────────

/// The storage capability the session middleware composes with.
///
/// `get_session` materializes a [`Session`] from the incoming `cookie`
/// header (`None` when the request carried none — a fresh, empty session).
/// `commit_session` persists the session and returns the serialized
/// `set-cookie` value that will reach the client.
///
/// Implementation errors propagate unmodified through the middleware chain;
/// wrap them with [`Error::storage`] or [`Error::Config`] as appropriate.
pub trait SessionStorage: Send + Sync + 'static {
    fn get_session(
        &self,
        cookie_header: Option<&str>,
    ) -> impl Future<Output = Result<Session, Error>> + Send;

    fn commit_session(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<String, Error>> + Send;
}

// ── MemoryStorage ────────────────────────────────────────────────────────────

/// In-process session storage for demos and tests.
///
/// Records live in a shared map keyed by session id; the cookie value is the
/// bare id. No signing, no expiry — anything a client can tamper with is a
/// real storage backend's job.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<String, HashMap<String, Value>>>>,
    next_id: Arc<AtomicU64>,
}

const COOKIE_NAME: &str = "session";

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the committed record for `id`, if any. Test hook.
    pub fn record(&self, id: &str) -> Option<HashMap<String, Value>> {
        self.records.lock().expect("records poisoned").get(id).cloned()
    }

    fn fresh_id(&self) -> String {
        format!("s{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Picks the session id out of a `cookie` header value.
    fn parse_cookie(header: &str) -> Option<&str> {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == COOKIE_NAME).then_some(value)
        })
    }
}

impl SessionStorage for MemoryStorage {
    async fn get_session(&self, cookie_header: Option<&str>) -> Result<Session, Error> {
        let known = cookie_header.and_then(Self::parse_cookie).and_then(|id| {
            self.records
                .lock()
                .expect("records poisoned")
                .get(id)
                .cloned()
                .map(|data| (id.to_owned(), data))
        });

        match known {
            Some((id, data)) => Ok(Session::new(id, data)),
            None => Ok(Session::new(self.fresh_id(), HashMap::new())),
        }
    }

    async fn commit_session(&self, session: &Session) -> Result<String, Error> {
        let id = session.id();
        self.records
            .lock()
            .expect("records poisoned")
            .insert(id.clone(), session.data());
        Ok(format!("{COOKIE_NAME}={id}; Path=/; HttpOnly"))
    }
}
