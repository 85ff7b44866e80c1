use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::cookie::Cookie;
use crate::error::Error;

/// Framework-agnostic view of one HTTP request/response exchange.
///
/// Authentication code is written against `WebContext` and never sees the
/// hosting server's types. Each server binding implements it once (see
/// [`ExchangeWebContext`](crate::web::ExchangeWebContext)).
///
/// # Absent Data
///
/// Lookups of request data that is not present return `None` rather than an
/// error. Only operations whose input cannot be represented on the exchange,
/// or whose collaborator fails, return `Err`.
///
/// # Examples
///
/// Code that only depends on the trait:
///
/// ```
/// use webcontext_core::WebContext;
///
/// fn redirect_to_login<C: WebContext>(ctx: &mut C) -> Result<(), webcontext_core::Error> {
///     let target = format!("/login?service={}", ctx.full_request_url());
///     ctx.set_response_status(302)?;
///     ctx.set_response_header("Location", &target)
/// }
/// ```
pub trait WebContext {
    /// Returns the first value of a request parameter.
    ///
    /// Query parameters take precedence over form fields.
    fn request_parameter(&self, name: &str) -> Option<String>;

    /// Returns every request parameter with all of its values.
    ///
    /// Query parameters and form fields are merged; a form field replaces a
    /// query parameter with the same name.
    fn request_parameters(&self) -> HashMap<String, Vec<String>>;

    /// Returns the first value of a request header.
    fn request_header(&self, name: &str) -> Option<String>;

    /// Stores a value in the user's session.
    fn set_session_attribute(&mut self, name: &str, value: Value) -> Result<(), Error>;

    /// Reads a value from the user's session.
    fn session_attribute(&self, name: &str) -> Result<Option<Value>, Error>;

    /// Returns the request method (`GET`, `POST`, ...).
    fn request_method(&self) -> &str;

    /// Sends `content` as the full response body.
    fn write_response_content(&mut self, content: &str);

    /// Sets the response status code.
    fn set_response_status(&mut self, code: u16) -> Result<(), Error>;

    /// Sets a response header, replacing existing values.
    fn set_response_header(&mut self, name: &str, value: &str) -> Result<(), Error>;

    /// Returns the host name the request was addressed to.
    fn server_name(&self) -> &str;

    /// Returns the port the request was addressed to.
    fn server_port(&self) -> u16;

    /// Returns the request scheme (`http` or `https`).
    ///
    /// This is the URI scheme, not the protocol version (`HTTP/1.1`) some
    /// servers report under the same name; [`is_secure`](Self::is_secure)
    /// relies on it.
    fn scheme(&self) -> &str;

    /// Returns the request URL, including the query string when there is one.
    fn full_request_url(&self) -> String;

    /// Returns the IP address of the client connection.
    fn remote_addr(&self) -> String;

    /// Adds a cookie to the response.
    fn add_response_cookie(&mut self, cookie: &Cookie);

    /// Stores a request-scoped attribute.
    ///
    /// Attributes are visible only through the same exchange.
    fn set_request_attribute<T: Serialize>(&mut self, name: &str, value: &T)
        -> Result<(), Error>;

    /// Reads a request-scoped attribute stored with
    /// [`set_request_attribute`](Self::set_request_attribute).
    fn request_attribute<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Error>;

    /// Returns the request path without the query string.
    fn path(&self) -> &str;

    /// Adds a `Content-Type` header to the response.
    fn set_response_content_type(&mut self, content_type: &str) -> Result<(), Error>;

    /// Returns the cookies sent with the request.
    fn request_cookies(&self) -> Vec<Cookie>;

    /// Returns the session ID, creating a session if needed.
    fn session_identifier(&mut self) -> Result<String, Error>;

    /// Returns `true` if the request arrived over HTTPS.
    fn is_secure(&self) -> bool {
        self.scheme().eq_ignore_ascii_case("https")
    }
}
