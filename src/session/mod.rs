//! Server-side sessions keyed by a cookie.
//!
//! This module provides the session collaborators a web context delegates to:
//! - [`SessionCookieConfig`]: how the session ID travels (cookie name, scope, flags)
//! - [`SessionManager`] / [`InMemorySessionManager`]: where sessions live
//! - [`SessionStore`] / [`ExchangeSessionStore`]: attribute access for one request
//!
//! A hosting server attaches one shared manager and a config to every exchange
//! with [`attach_sessions`]; the web context then builds its store from those
//! attachments.

mod config;
mod manager;
mod store;

use std::sync::Arc;

use crate::exchange::Exchange;

pub use config::{SessionCookieConfig, DEFAULT_SESSION_COOKIE_NAME};
pub use manager::{InMemorySessionManager, Session, SessionManager};
pub use store::{ExchangeSessionStore, SessionStore};

/// Attaches a session manager and config to an exchange.
pub fn attach_sessions(
    exchange: &mut Exchange,
    manager: Arc<dyn SessionManager>,
    config: SessionCookieConfig,
) {
    exchange.put_attachment(manager);
    exchange.put_attachment(config);
}
