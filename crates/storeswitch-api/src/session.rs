//! # Shopper Sessions
//!
//! Cookie-keyed session state: the signed-in customer (if any) and the
//! flash messages waiting to be shown.
//!
//! Session ids are always minted server-side, and only once a request has
//! something to store. A cookie naming an unknown or expired session is
//! never adopted. Sessions idle past the TTL are dropped, and a full map
//! evicts its least recently seen session before admitting a new one.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use storeswitch_core::{CurrentStoreResolver, Message, MessageSink, StoreId, StoreRepository};
use uuid::Uuid;

/// Cookie carrying the shopper's current store code.
pub const STORE_COOKIE: &str = "store";

/// Idle time after which a session is dropped.
pub const DEFAULT_SESSION_IDLE_SECS: i64 = 30 * 60;

/// Upper bound on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 100_000;

/// State kept per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    /// Signed-in customer.
    pub customer_id: Option<u64>,
    /// Flash messages not yet shown.
    pub messages: Vec<Message>,
}

#[derive(Debug)]
struct Slot {
    record: SessionRecord,
    last_seen: DateTime<Utc>,
}

/// Thread-safe, cloneable session map.
///
/// Synchronous `parking_lot::RwLock`: the lock is never held across an
/// `.await`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data: Arc<RwLock<HashMap<String, Slot>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_SESSION_IDLE_SECS),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

impl SessionStore {
    /// Create an empty store. `max_sessions` is at least one.
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            data: Arc::default(),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Start a new, empty session and return its id.
    pub fn create(&self) -> String {
        self.create_at(Utc::now())
    }

    fn create_at(&self, now: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let mut data = self.data.write();
        if data.len() >= self.max_sessions {
            let ttl = self.idle_ttl;
            data.retain(|_, slot| now - slot.last_seen <= ttl);
        }
        if data.len() >= self.max_sessions {
            let oldest = data
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                data.remove(&oldest);
                tracing::debug!(session = %oldest, "session evicted; store at capacity");
            }
        }
        data.insert(
            id.clone(),
            Slot {
                record: SessionRecord::default(),
                last_seen: now,
            },
        );
        tracing::debug!(session = %id, "session started");
        id
    }

    /// Whether session `id` is live. A live session is marked as seen; an
    /// expired one is removed.
    pub fn touch(&self, id: &str) -> bool {
        self.touch_at(id, Utc::now())
    }

    fn touch_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut data = self.data.write();
        let fresh = match data.get(id) {
            Some(slot) => now - slot.last_seen <= self.idle_ttl,
            None => return false,
        };
        if fresh {
            if let Some(slot) = data.get_mut(id) {
                slot.last_seen = now;
            }
        } else {
            data.remove(id);
            tracing::debug!(session = id, "session expired");
        }
        fresh
    }

    /// Retrieve a session by id.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.data.read().get(id).map(|slot| slot.record.clone())
    }

    /// Update a session in place. Returns `false` if it does not exist.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut SessionRecord)) -> bool {
        match self.data.write().get_mut(id) {
            Some(slot) => {
                f(&mut slot.record);
                true
            }
            None => false,
        }
    }

    /// Customer signed in to the session.
    pub fn customer_id(&self, id: &str) -> Option<u64> {
        self.data.read().get(id).and_then(|slot| slot.record.customer_id)
    }

    /// Take every queued message for the session.
    pub fn take_messages(&self, id: &str) -> Vec<Message> {
        self.data
            .write()
            .get_mut(id)
            .map(|slot| std::mem::take(&mut slot.record.messages))
            .unwrap_or_default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The session one request runs under.
///
/// Resumes the session the client names if it is live. Otherwise a session
/// is minted on first write: a queued message, a signed-in customer, or a
/// session id rendered into a URL.
pub struct RequestSession<'a> {
    store: &'a SessionStore,
    existing: Option<String>,
    minted: OnceLock<String>,
}

impl<'a> RequestSession<'a> {
    /// Resume `candidate` if it names a live session.
    pub fn resume(store: &'a SessionStore, candidate: Option<&str>) -> Self {
        Self {
            store,
            existing: candidate
                .filter(|id| store.touch(id))
                .map(str::to_string),
            minted: OnceLock::new(),
        }
    }

    /// Session id, minting a session if there is none yet.
    pub fn id(&self) -> &str {
        match &self.existing {
            Some(id) => id,
            None => self.minted.get_or_init(|| self.store.create()),
        }
    }

    /// Session id if one exists, without minting.
    pub fn current_id(&self) -> Option<&str> {
        self.existing
            .as_deref()
            .or_else(|| self.minted.get().map(String::as_str))
    }

    /// Id of the session minted by this request, if any.
    pub fn minted_id(&self) -> Option<&str> {
        self.minted.get().map(String::as_str)
    }

    /// Customer signed in to the session.
    pub fn customer_id(&self) -> Option<u64> {
        self.current_id()
            .and_then(|id| self.store.customer_id(id))
    }

    /// Sign `customer_id` in to the session.
    pub fn set_customer(&self, customer_id: u64) {
        self.store
            .update(self.id(), |r| r.customer_id = Some(customer_id));
    }

    /// Add the session cookie to `jar` when this request minted the session.
    pub fn persist(&self, jar: CookieJar, cookie_name: &str) -> CookieJar {
        match self.minted_id() {
            Some(id) => jar.add(site_cookie(cookie_name.to_string(), id.to_string())),
            None => jar,
        }
    }
}

impl MessageSink for RequestSession<'_> {
    fn add(&self, message: Message) {
        let id = self.id();
        if !self.store.update(id, |r| r.messages.push(message)) {
            tracing::warn!(session = id, "message dropped for unknown session");
        }
    }
}

/// Current store from the `store` cookie, falling back to the catalog
/// default when the cookie is absent, unknown, or names an inactive store.
pub struct CookieStoreResolver<'a> {
    stores: &'a dyn StoreRepository,
    cookie_code: Option<&'a str>,
    default_store: StoreId,
}

impl<'a> CookieStoreResolver<'a> {
    /// Resolver for one request.
    pub fn new(
        stores: &'a dyn StoreRepository,
        cookie_code: Option<&'a str>,
        default_store: StoreId,
    ) -> Self {
        Self {
            stores,
            cookie_code,
            default_store,
        }
    }
}

impl CurrentStoreResolver for CookieStoreResolver<'_> {
    fn current_store_id(&self) -> StoreId {
        self.cookie_code
            .and_then(|code| self.stores.get(code).ok())
            .filter(|store| store.is_active)
            .map_or(self.default_store, |store| store.id)
    }
}

/// Site-wide, HTTP-only, `SameSite=Lax` cookie.
pub fn site_cookie(name: impl Into<String>, value: impl Into<String>) -> Cookie<'static> {
    Cookie::build((name.into(), value.into()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
