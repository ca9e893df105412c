//! Per-request context: the request plus a typed key-value store.
//!
//! # Why keys are tokens, not strings
//!
//! Middleware stashes request-scoped state (a session, a locale, a storage
//! handle) for downstream code to pick up. If the store were keyed by plain
//! strings, two independently configured instances of the same middleware
//! kind — say, two session layers with different backends — would silently
//! overwrite each other under `"session"`. A [`Key`] is minted from a
//! process-wide counter at middleware construction time, so every layer
//! instance owns keys nothing else can collide with. The type parameter
//! makes `get` come back already downcast.
//!
//! # Sharing model
//!
//! [`Context`] is a cheap-clone handle: every clone sees the same store and
//! the same request. The pipeline creates one per inbound request and hands
//! clones down the middleware chain, so a middleware can keep working with
//! the context after `next` has run. Values are expected to be cheap-clone
//! handles themselves (`Arc`s, [`Session`](crate::Session)) — `get` clones
//! them out.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::request::Request;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque, typed key into a [`Context`] store.
///
/// Each call to [`Key::new`] yields a distinct key; copies of one key refer
/// to the same slot. `T` is what the slot holds.
pub struct Key<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Mints a fresh key. Never collides with any other key in the process.
    pub fn new() -> Self {
        Self {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Key<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> std::fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({})", self.id)
    }
}

/// The per-request context handed to middleware and handlers.
///
/// Clones share state: one context exists per request, no matter how many
/// handles to it are alive. Concurrent requests never share a context.
#[derive(Clone)]
pub struct Context {
    request: Arc<Request>,
    store: Arc<Mutex<HashMap<u64, Box<dyn Any + Send + Sync>>>>,
}

impl Context {
    pub(crate) fn new(request: Request) -> Self {
        Self {
            request: Arc::new(request),
            store: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The incoming request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Stores `value` under `key`, replacing any previous value in the slot.
    pub fn set<T: Send + Sync + 'static>(&self, key: Key<T>, value: T) {
        self.store
            .lock()
            .expect("context store poisoned")
            .insert(key.id, Box::new(value));
    }

    /// Clones out the value stored under `key`.
    ///
    /// `None` means nothing was ever stored in this slot — the middleware
    /// that owns the key has not run. Use [`require`](Context::require) when
    /// that case is a programming error rather than an expected state.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: Key<T>) -> Option<T> {
        self.store
            .lock()
            .expect("context store poisoned")
            .get(&key.id)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Like [`get`](Context::get), but maps an absent slot to
    /// [`Error::MiddlewareMissing`] naming `what` — the backbone of every
    /// middleware accessor. An empty-but-present value still succeeds; only
    /// a never-written slot fails.
    pub fn require<T: Clone + Send + Sync + 'static>(
        &self,
        key: Key<T>,
        what: &'static str,
    ) -> Result<T, Error> {
        self.get(key).ok_or(Error::MiddlewareMissing(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    fn ctx() -> Context {
        Context::new(Request::builder().uri("http://localhost/").build())
    }

    #[test]
    fn set_then_get_roundtrips() {
        let ctx = ctx();
        let key = Key::<String>::new();
        ctx.set(key, "value".to_owned());
        assert_eq!(ctx.get(key), Some("value".to_owned()));
    }

    #[test]
    fn distinct_keys_of_same_type_do_not_collide() {
        let ctx = ctx();
        let a = Key::<u32>::new();
        let b = Key::<u32>::new();
        ctx.set(a, 1);
        ctx.set(b, 2);
        assert_eq!(ctx.get(a), Some(1));
        assert_eq!(ctx.get(b), Some(2));
    }

    #[test]
    fn missing_slot_is_distinguishable_from_empty_value() {
        let ctx = ctx();
        let key = Key::<Vec<u8>>::new();

        // Never written: a configuration-style error.
        let err = ctx.require(key, "test").unwrap_err();
        assert!(matches!(err, Error::MiddlewareMissing("test")));

        // Written but empty: valid state.
        ctx.set(key, Vec::new());
        assert_eq!(ctx.require(key, "test").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn clones_share_one_store() {
        let ctx = ctx();
        let key = Key::<&'static str>::new();
        let other = ctx.clone();
        other.set(key, "shared");
        assert_eq!(ctx.get(key), Some("shared"));
    }
}
