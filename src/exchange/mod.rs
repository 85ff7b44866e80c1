//! Native HTTP exchange for a single in-flight request.
//!
//! An [`Exchange`] is what the hosting server hands to request-handling code:
//! the parsed request, the response being built, and a bag of type-keyed
//! attachments (session manager, session config, form data, ...).
//!
//! It is built from an `http::Request` and turned back into an
//! `http::Response` once handling completes:
//!
//! ```
//! use std::net::SocketAddr;
//! use webcontext_core::Exchange;
//!
//! let request = http::Request::get("https://example.com/login?next=%2Fhome")
//!     .header("cookie", "theme=dark")
//!     .body(String::new())
//!     .unwrap();
//! let remote: SocketAddr = "10.0.0.7:51000".parse().unwrap();
//!
//! let mut exchange = Exchange::from_request(request, remote);
//! assert_eq!(exchange.request_path(), "/login");
//! assert_eq!(exchange.query_parameters()["next"][0], "/home");
//! assert_eq!(exchange.request_cookies()["theme"].value, "dark");
//!
//! exchange.send("hello");
//! let response = exchange.into_response();
//! assert_eq!(response.body(), "hello");
//! ```

mod cookie;
mod form;

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::SocketAddr;

use http::header::{CONTENT_TYPE, COOKIE, HOST, SET_COOKIE};
use http::uri::Authority;
use http::{Extensions, HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use tracing::Span;
use uuid::Uuid;

use crate::error::Error;
use crate::logging::{exchange_span, ExchangeLog};

pub use cookie::{parse_cookie_header, ServerCookie};
pub use form::FormData;

/// Header a client or proxy may use to supply the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const DEFAULT_HOST: &str = "localhost";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// The request/response state of one HTTP call.
///
/// Request-side fields are fixed at construction (apart from cookies and
/// parameters a hosting server may add); response-side fields are mutated by
/// handlers and collected by [`into_response`](Self::into_response).
#[derive(Debug)]
pub struct Exchange {
    request_id: String,
    method: Method,
    request_scheme: String,
    host_name: String,
    host_port: u16,
    request_path: String,
    query_string: String,
    query_parameters: HashMap<String, VecDeque<String>>,
    path_parameters: HashMap<String, VecDeque<String>>,
    request_headers: HeaderMap,
    request_cookies: BTreeMap<String, ServerCookie>,
    source_address: SocketAddr,
    status: StatusCode,
    response_headers: HeaderMap,
    response_cookies: BTreeMap<String, ServerCookie>,
    response_body: Option<String>,
    committed: bool,
    attachments: Extensions,
    span: Span,
}

impl Exchange {
    /// Creates an exchange from a method, target URI and peer address.
    ///
    /// Scheme, host and port come from the URI when it is absolute; otherwise
    /// they default to `http`, `localhost` and the scheme's default port. A
    /// fresh request ID is generated.
    pub fn new(method: Method, uri: Uri, source_address: SocketAddr) -> Self {
        let request_scheme = uri.scheme_str().unwrap_or("http").to_string();
        let (host_name, host_port) = match uri.authority() {
            Some(authority) => split_authority(authority, &request_scheme),
            None => (DEFAULT_HOST.to_string(), default_port(&request_scheme)),
        };
        let query_string = uri.query().unwrap_or_default().to_string();

        let mut query_parameters: HashMap<String, VecDeque<String>> = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
            query_parameters
                .entry(name.into_owned())
                .or_default()
                .push_back(value.into_owned());
        }

        let request_id = Uuid::new_v4().to_string();
        let span = exchange_span(&request_id, &method, uri.path());
        Self {
            request_id,
            method,
            request_scheme,
            host_name,
            host_port,
            request_path: uri.path().to_string(),
            query_string,
            query_parameters,
            path_parameters: HashMap::new(),
            request_headers: HeaderMap::new(),
            request_cookies: BTreeMap::new(),
            source_address,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_cookies: BTreeMap::new(),
            response_body: None,
            committed: false,
            attachments: Extensions::new(),
            span,
        }
    }

    /// Creates an exchange from a complete `http::Request`.
    ///
    /// In addition to [`new`](Self::new), this:
    /// - copies the request headers and uses `Host` when the URI has no authority
    /// - takes the request ID from `X-Request-Id` when present
    /// - parses every `Cookie` header into request cookies
    /// - parses a form-encoded body into a [`FormData`] attachment
    /// - keeps the request's extensions as the exchange's attachments
    pub fn from_request<B: AsRef<[u8]>>(request: Request<B>, source_address: SocketAddr) -> Self {
        let (parts, body) = request.into_parts();
        let has_authority = parts.uri.authority().is_some();
        let mut exchange = Self::new(parts.method, parts.uri, source_address);

        if !has_authority {
            let host = parts
                .headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<Authority>().ok());
            if let Some(authority) = host {
                let (name, port) = split_authority(&authority, &exchange.request_scheme);
                exchange.host_name = name;
                exchange.host_port = port;
            }
        }

        if let Some(id) = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
        {
            exchange.request_id = id.trim().to_string();
            exchange.span = exchange_span(
                &exchange.request_id,
                &exchange.method,
                &exchange.request_path,
            );
        }

        for header in parts.headers.get_all(COOKIE) {
            if let Ok(header) = header.to_str() {
                for cookie in parse_cookie_header(header) {
                    exchange.add_request_cookie(cookie);
                }
            }
        }

        exchange.request_headers = parts.headers;
        exchange.attachments = parts.extensions;
        exchange.parse_form_data(body.as_ref());
        exchange
    }

    /// Returns the request ID for this exchange.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns a logger whose events are recorded under this exchange's span.
    pub fn log(&self) -> ExchangeLog<'_> {
        ExchangeLog::new(&self.request_id, &self.span)
    }

    /// Returns the `exchange` span carrying the request ID, method and path.
    ///
    /// Enter it (or `instrument` a future with it) to tag host-side events
    /// with the same fields.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Returns the request method.
    pub fn request_method(&self) -> &Method {
        &self.method
    }

    /// Returns the request scheme (`http` or `https`, as received).
    pub fn request_scheme(&self) -> &str {
        &self.request_scheme
    }

    /// Overrides the request scheme.
    ///
    /// Hosting servers terminating TLS in front of the exchange use this to
    /// record the scheme the client actually used.
    pub fn set_request_scheme(&mut self, scheme: impl Into<String>) {
        self.request_scheme = scheme.into();
    }

    /// Returns the host name the request was addressed to.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Returns the port the request was addressed to.
    pub fn host_port(&self) -> u16 {
        self.host_port
    }

    /// Returns the request path without the query string.
    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    /// Returns the raw query string (empty when there is none).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Reconstructs the request URL without its query string.
    ///
    /// The port is omitted when it is the default for the scheme.
    pub fn request_url(&self) -> String {
        if self.host_port == default_port(&self.request_scheme) {
            format!(
                "{}://{}{}",
                self.request_scheme, self.host_name, self.request_path
            )
        } else {
            format!(
                "{}://{}:{}{}",
                self.request_scheme, self.host_name, self.host_port, self.request_path
            )
        }
    }

    /// Returns the decoded query parameters.
    pub fn query_parameters(&self) -> &HashMap<String, VecDeque<String>> {
        &self.query_parameters
    }

    /// Appends a query parameter value.
    pub fn add_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query_parameters
            .entry(name.into())
            .or_default()
            .push_back(value.into());
    }

    /// Returns the path parameters.
    pub fn path_parameters(&self) -> &HashMap<String, VecDeque<String>> {
        &self.path_parameters
    }

    /// Appends a path parameter value.
    pub fn add_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_parameters
            .entry(name.into())
            .or_default()
            .push_back(value.into());
    }

    /// Replaces all values of a path parameter with a single value.
    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_parameters
            .insert(name.into(), VecDeque::from([value.into()]));
    }

    /// Returns the request headers.
    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    /// Returns the request headers for modification.
    pub fn request_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.request_headers
    }

    /// Returns the request cookies keyed by name.
    pub fn request_cookies(&self) -> &BTreeMap<String, ServerCookie> {
        &self.request_cookies
    }

    /// Adds a request cookie, replacing any cookie with the same name.
    pub fn add_request_cookie(&mut self, cookie: ServerCookie) {
        self.request_cookies.insert(cookie.name.clone(), cookie);
    }

    /// Returns the address of the peer that sent the request.
    pub fn source_address(&self) -> SocketAddr {
        self.source_address
    }

    /// Returns the response status.
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status.
    pub fn set_status_code(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the response headers.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Returns the response headers for modification.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Returns the response cookies keyed by name.
    pub fn response_cookies(&self) -> &BTreeMap<String, ServerCookie> {
        &self.response_cookies
    }

    /// Sets a response cookie, replacing any earlier cookie with the same name.
    pub fn set_response_cookie(&mut self, cookie: ServerCookie) {
        self.response_cookies.insert(cookie.name.clone(), cookie);
    }

    /// Sends `body` as the complete response body and commits the response.
    pub fn send(&mut self, body: impl Into<String>) {
        if self.committed {
            self.log()
                .warn(format_args!("response already committed, replacing body"));
        }
        let body = body.into();
        self.log()
            .debug(format_args!("committing response body ({} bytes)", body.len()));
        self.response_body = Some(body);
        self.committed = true;
    }

    /// Returns the response body, if one was sent.
    pub fn response_body(&self) -> Option<&str> {
        self.response_body.as_deref()
    }

    /// Returns `true` once a response body has been sent.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Returns the attachment of type `T`, if any.
    pub fn attachment<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.attachments.get::<T>()
    }

    /// Attaches a value, returning the previous attachment of the same type.
    pub fn put_attachment<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.attachments.insert(value)
    }

    /// Removes and returns the attachment of type `T`.
    pub fn remove_attachment<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.attachments.remove::<T>()
    }

    /// Returns the parsed form, if the request carried one.
    pub fn form_data(&self) -> Option<&FormData> {
        self.attachment::<FormData>()
    }

    /// Parses `body` as form data when the request is form-encoded.
    ///
    /// Returns `true` if a [`FormData`] attachment was added.
    pub fn parse_form_data(&mut self, body: &[u8]) -> bool {
        let is_form = self
            .request_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .eq_ignore_ascii_case(FORM_URLENCODED)
            })
            .unwrap_or(false);

        if !is_form {
            return false;
        }
        self.put_attachment(FormData::parse_urlencoded(body));
        true
    }

    /// Completes the exchange, producing the response to write to the client.
    ///
    /// Response cookies become `Set-Cookie` headers. A cookie that cannot be
    /// rendered safely (see [`ServerCookie::to_set_cookie_header`]) is dropped
    /// with a warning.
    pub fn into_response(self) -> Response<String> {
        let log = self.log();
        let mut headers = self.response_headers.clone();
        for cookie in self.response_cookies.values() {
            let rendered = cookie
                .to_set_cookie_header()
                .and_then(|header| HeaderValue::from_str(&header).map_err(Error::from));
            match rendered {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => log.warn(format_args!("dropping cookie '{}': {}", cookie.name, e)),
            }
        }

        let mut response = Response::new(self.response_body.clone().unwrap_or_default());
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

fn split_authority(authority: &Authority, scheme: &str) -> (String, u16) {
    let port = authority.port_u16().unwrap_or_else(|| default_port(scheme));
    (authority.host().to_string(), port)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> SocketAddr {
        "192.168.1.20:40000".parse().unwrap()
    }

    #[test]
    fn absolute_uri_sets_connection_metadata() {
        let exchange = Exchange::new(
            Method::GET,
            "https://auth.example.com:8443/callback?code=xyz".parse().unwrap(),
            remote(),
        );

        assert_eq!(exchange.request_scheme(), "https");
        assert_eq!(exchange.host_name(), "auth.example.com");
        assert_eq!(exchange.host_port(), 8443);
        assert_eq!(exchange.request_path(), "/callback");
        assert_eq!(exchange.query_string(), "code=xyz");
        assert_eq!(
            exchange.request_url(),
            "https://auth.example.com:8443/callback"
        );
    }

    #[test]
    fn relative_uri_uses_defaults() {
        let exchange = Exchange::new(Method::POST, "/login".parse().unwrap(), remote());

        assert_eq!(exchange.request_scheme(), "http");
        assert_eq!(exchange.host_name(), "localhost");
        assert_eq!(exchange.host_port(), 80);
        assert_eq!(exchange.request_url(), "http://localhost/login");
        assert!(exchange.query_string().is_empty());
    }

    #[test]
    fn request_ids_are_unique() {
        let a = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        let b = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.log().request_id(), a.request_id());
    }

    #[test]
    fn query_parameters_keep_all_values() {
        let exchange = Exchange::new(
            Method::GET,
            "/search?tag=a&tag=b&q=rust+web".parse().unwrap(),
            remote(),
        );

        let tags: Vec<&str> = exchange.query_parameters()["tag"]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(exchange.query_parameters()["q"][0], "rust web");
    }

    #[test]
    fn from_request_uses_host_header() {
        let request = Request::get("/home")
            .header(HOST, "app.internal:9000")
            .body(Vec::new())
            .unwrap();
        let exchange = Exchange::from_request(request, remote());

        assert_eq!(exchange.host_name(), "app.internal");
        assert_eq!(exchange.host_port(), 9000);
        assert_eq!(exchange.request_url(), "http://app.internal:9000/home");
    }

    #[test]
    fn from_request_takes_request_id_header() {
        let request = Request::get("/")
            .header(REQUEST_ID_HEADER, "req-from-proxy")
            .body("")
            .unwrap();
        let exchange = Exchange::from_request(request, remote());
        assert_eq!(exchange.request_id(), "req-from-proxy");
    }

    #[test]
    fn from_request_parses_all_cookie_headers() {
        let request = Request::get("/")
            .header(COOKIE, "a=1; b=2")
            .header(COOKIE, "c=3")
            .body("")
            .unwrap();
        let exchange = Exchange::from_request(request, remote());

        let names: Vec<&str> = exchange.request_cookies().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn from_request_parses_form_body() {
        let request = Request::post("/login")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=UTF-8")
            .body("username=alice&password=secret")
            .unwrap();
        let exchange = Exchange::from_request(request, remote());

        let form = exchange.form_data().expect("form attached");
        assert_eq!(form.first("username"), Some("alice"));
    }

    #[test]
    fn from_request_ignores_non_form_body() {
        let request = Request::post("/api")
            .header(CONTENT_TYPE, "application/json")
            .body(r#"{"a":1}"#)
            .unwrap();
        let exchange = Exchange::from_request(request, remote());
        assert!(exchange.form_data().is_none());
    }

    #[test]
    fn from_request_keeps_extensions() {
        #[derive(Clone)]
        struct Marker(u8);

        let mut request = Request::get("/").body("").unwrap();
        request.extensions_mut().insert(Marker(7));
        let exchange = Exchange::from_request(request, remote());

        assert_eq!(exchange.attachment::<Marker>().map(|m| m.0), Some(7));
    }

    #[test]
    fn path_params_append_and_replace() {
        let mut exchange = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        exchange.add_path_param("id", "1");
        exchange.add_path_param("id", "2");
        assert_eq!(exchange.path_parameters()["id"].len(), 2);

        exchange.set_path_param("id", "3");
        assert_eq!(exchange.path_parameters()["id"], VecDeque::from(["3".to_string()]));
    }

    #[test]
    fn attachments_are_type_keyed() {
        let mut exchange = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        assert!(exchange.put_attachment(5u32).is_none());
        assert_eq!(exchange.put_attachment(6u32), Some(5));
        assert_eq!(exchange.attachment::<u32>(), Some(&6));
        assert_eq!(exchange.remove_attachment::<u32>(), Some(6));
        assert!(exchange.attachment::<u32>().is_none());
    }

    #[test]
    fn send_commits_response() {
        let mut exchange = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        assert!(!exchange.is_committed());

        exchange.send("first");
        exchange.send("second");

        assert!(exchange.is_committed());
        assert_eq!(exchange.response_body(), Some("second"));
    }

    #[test]
    fn into_response_renders_status_headers_and_cookies() {
        let mut exchange = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        exchange.set_status_code(StatusCode::FOUND);
        exchange
            .response_headers_mut()
            .insert(http::header::LOCATION, HeaderValue::from_static("/login"));
        let mut cookie = ServerCookie::new("sid", "abc");
        cookie.http_only = true;
        exchange.set_response_cookie(cookie);
        exchange.set_response_cookie(ServerCookie::new("theme", "dark"));

        let response = exchange.into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/login");
        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies, vec!["sid=abc; HttpOnly", "theme=dark"]);
        assert_eq!(response.body(), "");
    }

    #[test]
    fn invalid_cookie_is_dropped_from_response() {
        let mut exchange = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        exchange.set_response_cookie(ServerCookie::new("bad", "line\nbreak"));

        let response = exchange.into_response();
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn smuggled_cookie_attributes_never_reach_the_response() {
        let mut exchange = Exchange::new(Method::GET, "/".parse().unwrap(), remote());
        exchange.set_response_cookie(ServerCookie::new(
            "next",
            "x; Domain=evil.example; Max-Age=999999",
        ));
        let mut commented = ServerCookie::new("note", "ok");
        commented.comment = Some("hi; Domain=evil.example".to_string());
        exchange.set_response_cookie(commented);
        exchange.set_response_cookie(ServerCookie::new("theme", "dark"));

        let response = exchange.into_response();
        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies, vec!["theme=dark"]);
    }
}
