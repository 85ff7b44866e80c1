use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use super::SessionCookieConfig;
use crate::exchange::Exchange;

/// A server-side session.
///
/// Sessions are shared between the manager and every request that carries
/// the session ID, so the attribute map is internally locked.
#[derive(Debug)]
pub struct Session {
    id: String,
    attributes: RwLock<HashMap<String, Value>>,
    created_at: Instant,
    last_accessed: Mutex<Instant>,
}

impl Session {
    fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            attributes: RwLock::new(HashMap::new()),
            created_at: now,
            last_accessed: Mutex::new(now),
        }
    }

    /// Returns the session ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a copy of an attribute value.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes.read().get(name).cloned()
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attribute(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.write().insert(name.into(), value)
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.write().remove(name)
    }

    /// Returns the names of all attributes.
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.read().keys().cloned().collect()
    }

    /// When the session was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the session was last looked up.
    pub fn last_accessed(&self) -> Instant {
        *self.last_accessed.lock()
    }

    fn touch(&self) {
        *self.last_accessed.lock() = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_accessed().elapsed() >= timeout
    }
}

/// Creates, finds and destroys sessions for exchanges.
///
/// A manager is shared by every request the server handles; it is attached
/// to each exchange as an `Arc<dyn SessionManager>`.
pub trait SessionManager: Send + Sync + fmt::Debug {
    /// Returns the live session identified by the exchange, if any.
    fn get_session(&self, exchange: &Exchange, config: &SessionCookieConfig)
        -> Option<Arc<Session>>;

    /// Creates a new session and records its ID on the exchange.
    fn create_session(&self, exchange: &mut Exchange, config: &SessionCookieConfig)
        -> Arc<Session>;

    /// Destroys the session identified by the exchange and tells the client
    /// to forget it. Returns `true` if a session was destroyed.
    fn invalidate(&self, exchange: &mut Exchange, config: &SessionCookieConfig) -> bool;
}

/// Process-local session storage with idle expiry.
///
/// Sessions not looked up within the timeout are dropped the next time
/// someone asks for them, and swept whenever a new session is created.
/// Hosts with long quiet periods can also call
/// [`cleanup_expired`](Self::cleanup_expired) on a timer.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use webcontext_core::InMemorySessionManager;
///
/// let manager = InMemorySessionManager::with_timeout(Duration::from_secs(600));
/// assert_eq!(manager.timeout(), Duration::from_secs(600));
/// assert_eq!(manager.active_sessions(), 0);
/// ```
#[derive(Debug)]
pub struct InMemorySessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    timeout: Duration,
}

impl InMemorySessionManager {
    /// Idle timeout used by [`new`](Self::new).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    /// Creates a manager with the default idle timeout.
    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Creates a manager with a custom idle timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Returns the idle timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of stored sessions, expired ones included until
    /// they are next looked up.
    pub fn active_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// Removes every expired session, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let removed = sweep(&mut self.sessions.write(), self.timeout);
        if removed > 0 {
            tracing::debug!(removed, "expired sessions swept");
        }
        removed
    }
}

fn sweep(sessions: &mut HashMap<String, Arc<Session>>, timeout: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired(timeout));
    before - sessions.len()
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager for InMemorySessionManager {
    fn get_session(
        &self,
        exchange: &Exchange,
        config: &SessionCookieConfig,
    ) -> Option<Arc<Session>> {
        let id = config.find_session_id(exchange)?;
        let session = self.sessions.read().get(&id).cloned()?;

        if session.is_expired(self.timeout) {
            self.sessions.write().remove(&id);
            exchange
                .log()
                .debug(format_args!("session {} expired", session.id()));
            return None;
        }

        session.touch();
        Some(session)
    }

    fn create_session(
        &self,
        exchange: &mut Exchange,
        config: &SessionCookieConfig,
    ) -> Arc<Session> {
        let session = Arc::new(Session::new(Uuid::new_v4().to_string()));
        let swept = {
            let mut sessions = self.sessions.write();
            let swept = sweep(&mut sessions, self.timeout);
            sessions.insert(session.id().to_string(), Arc::clone(&session));
            swept
        };
        if swept > 0 {
            exchange
                .log()
                .debug(format_args!("{} expired sessions swept", swept));
        }
        config.set_session_id(exchange, session.id());
        exchange
            .log()
            .debug(format_args!("session {} created", session.id()));
        session
    }

    fn invalidate(&self, exchange: &mut Exchange, config: &SessionCookieConfig) -> bool {
        let Some(id) = config.find_session_id(exchange) else {
            return false;
        };
        let removed = self.sessions.write().remove(&id).is_some();
        config.clear_session(exchange);
        if removed {
            exchange
                .log()
                .debug(format_args!("session {} invalidated", id));
        }
        removed
    }
}
