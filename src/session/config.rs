use serde::Deserialize;

use crate::exchange::{Exchange, ServerCookie};

/// Cookie name used when none is configured.
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "JSESSIONID";

/// Carries the session ID between client and server in a cookie.
///
/// Every field has a default, so the config can be embedded in a host
/// application's configuration file and only the overrides spelled out:
///
/// ```
/// use webcontext_core::SessionCookieConfig;
///
/// let config: SessionCookieConfig =
///     serde_json::from_str(r#"{ "cookie_name": "SID", "secure": true }"#).unwrap();
///
/// assert_eq!(config.cookie_name, "SID");
/// assert_eq!(config.path, "/");
/// assert!(config.secure);
/// assert!(config.http_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionCookieConfig {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Path the cookie is scoped to
    pub path: String,
    /// Domain the cookie is scoped to
    pub domain: Option<String>,
    /// Comment attached to the cookie
    pub comment: Option<String>,
    /// Lifetime in seconds; `None` makes it a browser-session cookie
    pub max_age: Option<i64>,
    /// Only send over secure transports
    pub secure: bool,
    /// Hide from client-side scripts
    pub http_only: bool,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            domain: None,
            comment: None,
            max_age: None,
            secure: false,
            http_only: true,
        }
    }
}

impl SessionCookieConfig {
    /// Finds the session ID carried by an exchange.
    ///
    /// A session cookie already set on the response (a session created earlier
    /// in the same exchange) wins over the one the client sent. A response
    /// cookie that clears the session hides the request cookie.
    pub fn find_session_id(&self, exchange: &Exchange) -> Option<String> {
        if let Some(cookie) = exchange.response_cookies().get(&self.cookie_name) {
            if cookie.max_age == Some(0) || cookie.value.is_empty() {
                return None;
            }
            return Some(cookie.value.clone());
        }
        exchange
            .request_cookies()
            .get(&self.cookie_name)
            .map(|c| c.value.clone())
            .filter(|v| !v.is_empty())
    }

    /// Writes the session cookie for `session_id` to the response.
    pub fn set_session_id(&self, exchange: &mut Exchange, session_id: &str) {
        exchange.set_response_cookie(self.cookie(session_id));
    }

    /// Writes a cookie that makes the client drop its session ID.
    pub fn clear_session(&self, exchange: &mut Exchange) {
        let mut cookie = self.cookie("");
        cookie.max_age = Some(0);
        exchange.set_response_cookie(cookie);
    }

    fn cookie(&self, value: &str) -> ServerCookie {
        ServerCookie {
            name: self.cookie_name.clone(),
            value: value.to_string(),
            comment: self.comment.clone(),
            domain: self.domain.clone(),
            path: Some(self.path.clone()),
            max_age: self.max_age,
            secure: self.secure,
            http_only: self.http_only,
        }
    }
}
