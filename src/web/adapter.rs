//! Web context over a native [`Exchange`].

use std::collections::HashMap;

use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::context::WebContext;
use crate::cookie::Cookie;
use crate::error::Error;
use crate::exchange::{Exchange, ServerCookie};
use crate::serialization::{deserialize_from_base64, serialize_to_base64};
use crate::session::{ExchangeSessionStore, SessionStore};

/// [`WebContext`] implementation for the native [`Exchange`].
///
/// `ExchangeWebContext` is the integration point between the hosting server
/// and authentication code. It borrows the exchange for the duration of one
/// request and forwards every operation to it:
/// - request data (parameters, headers, cookies) is read from the exchange
/// - response mutations (status, headers, cookies, body) are applied to it
/// - session operations go through an [`ExchangeSessionStore`] built from the
///   session manager and config attached to the exchange
///
/// # Design Notes
///
/// Request attributes are stored base64-encoded in the exchange's path
/// parameters, so they are only visible through the same exchange. Setting an
/// attribute replaces any earlier value under the same name.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use webcontext_core::{
///     attach_sessions, Exchange, InMemorySessionManager, SessionCookieConfig, WebContext,
/// };
/// use webcontext_core::web::ExchangeWebContext;
///
/// let request = http::Request::post("https://example.com/callback?client=web")
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body("code=abc123")
///     .unwrap();
/// let mut exchange = Exchange::from_request(request, "203.0.113.9:443".parse().unwrap());
/// attach_sessions(
///     &mut exchange,
///     Arc::new(InMemorySessionManager::new()),
///     SessionCookieConfig::default(),
/// );
///
/// let mut ctx = ExchangeWebContext::new(&mut exchange);
/// assert_eq!(ctx.request_parameter("client").as_deref(), Some("web"));
/// assert_eq!(ctx.request_parameter("code").as_deref(), Some("abc123"));
/// assert!(ctx.is_secure());
///
/// ctx.set_session_attribute("state", serde_json::json!("verified")).unwrap();
/// let session_id = ctx.session_identifier().unwrap();
/// assert_eq!(
///     exchange.response_cookies()["JSESSIONID"].value,
///     session_id
/// );
/// ```
#[derive(Debug)]
pub struct ExchangeWebContext<'a> {
    exchange: &'a mut Exchange,
    session_store: ExchangeSessionStore,
}

impl<'a> ExchangeWebContext<'a> {
    /// Creates a web context for an exchange.
    ///
    /// The session store is built from the exchange's attachments at this
    /// point; attaching a session manager afterwards has no effect on this
    /// context.
    pub fn new(exchange: &'a mut Exchange) -> Self {
        let session_store = ExchangeSessionStore::from_exchange(exchange);
        Self {
            exchange,
            session_store,
        }
    }

    /// Returns the underlying exchange.
    pub fn exchange(&self) -> &Exchange {
        self.exchange
    }

    /// Returns the underlying exchange for modification.
    pub fn exchange_mut(&mut self) -> &mut Exchange {
        self.exchange
    }

    /// Returns the session store this context delegates to.
    pub fn session_store(&self) -> &ExchangeSessionStore {
        &self.session_store
    }
}

impl WebContext for ExchangeWebContext<'_> {
    fn request_parameter(&self, name: &str) -> Option<String> {
        if let Some(values) = self.exchange.query_parameters().get(name) {
            return values.front().cloned();
        }
        self.exchange
            .form_data()
            .and_then(|form| form.first(name))
            .map(str::to_string)
    }

    fn request_parameters(&self) -> HashMap<String, Vec<String>> {
        let mut params: HashMap<String, Vec<String>> = self
            .exchange
            .query_parameters()
            .iter()
            .map(|(name, values)| (name.clone(), values.iter().cloned().collect()))
            .collect();

        if let Some(form) = self.exchange.form_data() {
            for (name, values) in form.iter() {
                params.insert(name.to_string(), values.iter().cloned().collect());
            }
        }
        params
    }

    fn request_header(&self, name: &str) -> Option<String> {
        self.exchange
            .request_headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn set_session_attribute(&mut self, name: &str, value: Value) -> Result<(), Error> {
        self.session_store.set(self.exchange, name, value)
    }

    fn session_attribute(&self, name: &str) -> Result<Option<Value>, Error> {
        self.session_store.get(self.exchange(), name)
    }

    fn request_method(&self) -> &str {
        self.exchange.request_method().as_str()
    }

    fn write_response_content(&mut self, content: &str) {
        self.exchange.send(content);
    }

    fn set_response_status(&mut self, code: u16) -> Result<(), Error> {
        let status = StatusCode::from_u16(code).map_err(|e| {
            self.exchange
                .log()
                .warn(format_args!("rejecting response status {}", code));
            Error::from(e)
        })?;
        self.exchange.set_status_code(status);
        Ok(())
    }

    fn set_response_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let header = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.exchange.response_headers_mut().insert(header, value);
        Ok(())
    }

    fn server_name(&self) -> &str {
        self.exchange.host_name()
    }

    fn server_port(&self) -> u16 {
        self.exchange.host_port()
    }

    fn scheme(&self) -> &str {
        self.exchange.request_scheme()
    }

    fn full_request_url(&self) -> String {
        let mut full = self.exchange.request_url();
        let query = self.exchange.query_string();
        if !query.trim().is_empty() {
            full.push('?');
            full.push_str(query);
        }
        full
    }

    fn remote_addr(&self) -> String {
        self.exchange.source_address().ip().to_string()
    }

    fn add_response_cookie(&mut self, cookie: &Cookie) {
        self.exchange.set_response_cookie(ServerCookie::from(cookie));
    }

    fn set_request_attribute<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), Error> {
        let encoded = serialize_to_base64(value)?;
        self.exchange.set_path_param(name, encoded);
        Ok(())
    }

    fn request_attribute<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Error> {
        match self
            .exchange
            .path_parameters()
            .get(name)
            .and_then(|values| values.front())
        {
            Some(encoded) => deserialize_from_base64(encoded).map(Some),
            None => Ok(None),
        }
    }

    fn path(&self) -> &str {
        self.exchange.request_path()
    }

    fn set_response_content_type(&mut self, content_type: &str) -> Result<(), Error> {
        let value = HeaderValue::from_str(content_type)?;
        self.exchange.response_headers_mut().append(CONTENT_TYPE, value);
        Ok(())
    }

    fn request_cookies(&self) -> Vec<Cookie> {
        self.exchange
            .request_cookies()
            .values()
            .map(Cookie::from)
            .collect()
    }

    fn session_identifier(&mut self) -> Result<String, Error> {
        self.session_store.get_or_create_session_id(self.exchange)
    }
}

impl From<&ServerCookie> for Cookie {
    fn from(native: &ServerCookie) -> Self {
        let mut cookie = Cookie::new(native.name.clone(), native.value.clone())
            .with_secure(native.secure)
            .with_http_only(native.http_only);
        cookie.set_comment(native.comment.clone());
        cookie.set_domain(native.domain.clone());
        cookie.set_path(native.path.clone());
        cookie.set_max_age(native.max_age);
        cookie
    }
}

impl From<&Cookie> for ServerCookie {
    fn from(cookie: &Cookie) -> Self {
        ServerCookie {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            comment: cookie.comment().map(str::to_string),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            max_age: cookie.max_age(),
            secure: cookie.is_secure(),
            http_only: cookie.is_http_only(),
        }
    }
}
