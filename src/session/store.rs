use std::sync::Arc;

use serde_json::Value;

use super::{Session, SessionCookieConfig, SessionManager};
use crate::error::{Error, ErrorKind};
use crate::exchange::Exchange;

/// Session attribute storage as seen by a web context.
///
/// Each operation receives the exchange of the request being handled, so one
/// store implementation can serve any number of sequential requests.
pub trait SessionStore {
    /// Returns the session ID, creating a session when there is none.
    fn get_or_create_session_id(&self, exchange: &mut Exchange) -> Result<String, Error>;

    /// Returns a session attribute, or `None` when either the session or the
    /// attribute is missing.
    fn get(&self, exchange: &Exchange, key: &str) -> Result<Option<Value>, Error>;

    /// Sets a session attribute, creating a session when there is none.
    fn set(&self, exchange: &mut Exchange, key: &str, value: Value) -> Result<(), Error>;
}

/// [`SessionStore`] backed by the session manager and config attached to an
/// exchange.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use webcontext_core::{
///     attach_sessions, Exchange, ExchangeSessionStore, InMemorySessionManager,
///     SessionCookieConfig, SessionStore,
/// };
///
/// let mut exchange = Exchange::new(
///     http::Method::GET,
///     "/".parse().unwrap(),
///     "127.0.0.1:4000".parse().unwrap(),
/// );
/// attach_sessions(
///     &mut exchange,
///     Arc::new(InMemorySessionManager::new()),
///     SessionCookieConfig::default(),
/// );
///
/// let store = ExchangeSessionStore::from_exchange(&exchange);
/// store.set(&mut exchange, "user", serde_json::json!("alice")).unwrap();
/// assert_eq!(
///     store.get(&exchange, "user").unwrap(),
///     Some(serde_json::json!("alice"))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ExchangeSessionStore {
    manager: Option<Arc<dyn SessionManager>>,
    config: Option<SessionCookieConfig>,
}

impl ExchangeSessionStore {
    /// Creates a store from a session manager and config.
    ///
    /// Either may be missing; session operations then fail with
    /// `ErrorKind::SessionUnavailable`.
    pub fn new(
        manager: Option<Arc<dyn SessionManager>>,
        config: Option<SessionCookieConfig>,
    ) -> Self {
        Self { manager, config }
    }

    /// Creates a store from the session manager and config attached to an
    /// exchange.
    pub fn from_exchange(exchange: &Exchange) -> Self {
        Self::new(
            exchange.attachment::<Arc<dyn SessionManager>>().cloned(),
            exchange.attachment::<SessionCookieConfig>().cloned(),
        )
    }

    /// Returns `true` if both a manager and a config are present.
    pub fn is_available(&self) -> bool {
        self.manager.is_some() && self.config.is_some()
    }

    /// Destroys the current session, if any.
    pub fn invalidate(&self, exchange: &mut Exchange) -> Result<bool, Error> {
        let (manager, config) = self.parts()?;
        Ok(manager.invalidate(exchange, config))
    }

    fn parts(&self) -> Result<(&Arc<dyn SessionManager>, &SessionCookieConfig), Error> {
        match (&self.manager, &self.config) {
            (Some(manager), Some(config)) => Ok((manager, config)),
            (None, _) => Err(Error::with_message(
                ErrorKind::SessionUnavailable,
                "no session manager attached to exchange",
            )),
            (_, None) => Err(Error::with_message(
                ErrorKind::SessionUnavailable,
                "no session config attached to exchange",
            )),
        }
    }

    fn get_or_create_session(&self, exchange: &mut Exchange) -> Result<Arc<Session>, Error> {
        let (manager, config) = self.parts()?;
        match manager.get_session(exchange, config) {
            Some(session) => Ok(session),
            None => Ok(manager.create_session(exchange, config)),
        }
    }
}

impl SessionStore for ExchangeSessionStore {
    fn get_or_create_session_id(&self, exchange: &mut Exchange) -> Result<String, Error> {
        Ok(self.get_or_create_session(exchange)?.id().to_string())
    }

    fn get(&self, exchange: &Exchange, key: &str) -> Result<Option<Value>, Error> {
        let (manager, config) = self.parts()?;
        Ok(manager
            .get_session(exchange, config)
            .and_then(|session| session.attribute(key)))
    }

    fn set(&self, exchange: &mut Exchange, key: &str, value: Value) -> Result<(), Error> {
        self.get_or_create_session(exchange)?
            .set_attribute(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::exchange::ServerCookie;
    use crate::session::{attach_sessions, InMemorySessionManager};

    fn exchange() -> Exchange {
        Exchange::new(
            Method::GET,
            "/".parse().unwrap(),
            "127.0.0.1:9999".parse().unwrap(),
        )
    }

    fn attached(manager: &Arc<InMemorySessionManager>) -> Exchange {
        let mut exchange = exchange();
        attach_sessions(
            &mut exchange,
            Arc::clone(manager) as Arc<dyn SessionManager>,
            SessionCookieConfig::default(),
        );
        exchange
    }

    #[test]
    fn missing_attachments_are_unavailable() {
        let mut exchange = exchange();
        let store = ExchangeSessionStore::from_exchange(&exchange);

        assert!(!store.is_available());
        let err = store.get_or_create_session_id(&mut exchange).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionUnavailable);
        assert!(store.get(&exchange, "k").is_err());
    }

    #[test]
    fn missing_config_is_unavailable() {
        let store = ExchangeSessionStore::new(Some(Arc::new(InMemorySessionManager::new())), None);
        let err = store.get(&exchange(), "k").unwrap_err();
        assert_eq!(err.message(), Some("no session config attached to exchange"));
    }

    #[test]
    fn session_id_is_stable_within_exchange() {
        let manager = Arc::new(InMemorySessionManager::new());
        let mut exchange = attached(&manager);
        let store = ExchangeSessionStore::from_exchange(&exchange);

        let first = store.get_or_create_session_id(&mut exchange).unwrap();
        let second = store.get_or_create_session_id(&mut exchange).unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.active_sessions(), 1);
    }

    #[test]
    fn get_does_not_create_session() {
        let manager = Arc::new(InMemorySessionManager::new());
        let exchange = attached(&manager);
        let store = ExchangeSessionStore::from_exchange(&exchange);

        assert_eq!(store.get(&exchange, "user").unwrap(), None);
        assert_eq!(manager.active_sessions(), 0);
        assert!(exchange.response_cookies().is_empty());
    }

    #[test]
    fn attributes_survive_across_exchanges() {
        let manager = Arc::new(InMemorySessionManager::new());

        let mut first = attached(&manager);
        let store = ExchangeSessionStore::from_exchange(&first);
        store.set(&mut first, "user", json!({"id": 7})).unwrap();
        let id = first.response_cookies()["JSESSIONID"].value.clone();

        let mut second = attached(&manager);
        second.add_request_cookie(ServerCookie::new("JSESSIONID", id));
        let store = ExchangeSessionStore::from_exchange(&second);

        assert_eq!(store.get(&second, "user").unwrap(), Some(json!({"id": 7})));
    }

    #[test]
    fn invalidate_ends_session() {
        let manager = Arc::new(InMemorySessionManager::new());
        let mut exchange = attached(&manager);
        let store = ExchangeSessionStore::from_exchange(&exchange);
        store.set(&mut exchange, "k", json!(1)).unwrap();

        assert!(store.invalidate(&mut exchange).unwrap());
        assert_eq!(store.get(&exchange, "k").unwrap(), None);
    }
}
