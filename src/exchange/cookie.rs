//! Native server cookies and their header codecs.

use std::fmt::Write as _;

use crate::error::{Error, ErrorKind};

/// A cookie as the server exchange stores it.
///
/// Request cookies parsed from a `Cookie` header only carry a name and value;
/// response cookies carry every attribute and are rendered into `Set-Cookie`
/// headers by [`to_set_cookie_header`](Self::to_set_cookie_header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Free-form comment (legacy attribute)
    pub comment: Option<String>,
    /// Domain the cookie is scoped to
    pub domain: Option<String>,
    /// Path the cookie is scoped to
    pub path: Option<String>,
    /// Lifetime in seconds; `Some(0)` expires the cookie immediately
    pub max_age: Option<i64>,
    /// Only send over secure transports
    pub secure: bool,
    /// Hide from client-side scripts
    pub http_only: bool,
}

impl ServerCookie {
    /// Creates a cookie with only a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            comment: None,
            domain: None,
            path: None,
            max_age: None,
            secure: false,
            http_only: false,
        }
    }

    /// Renders this cookie as a `Set-Cookie` header value.
    ///
    /// The name must be an HTTP token and the value a run of cookie octets,
    /// optionally wrapped in double quotes. Attribute values must not contain
    /// `;` or control characters. Anything else could add attributes the
    /// cookie was never given, so it is rejected with
    /// [`ErrorKind::InvalidCookie`].
    ///
    /// # Examples
    ///
    /// ```
    /// use webcontext_core::{ErrorKind, ServerCookie};
    ///
    /// let mut cookie = ServerCookie::new("JSESSIONID", "abc");
    /// cookie.path = Some("/".to_string());
    /// cookie.http_only = true;
    /// assert_eq!(cookie.to_set_cookie_header().unwrap(), "JSESSIONID=abc; Path=/; HttpOnly");
    ///
    /// let forged = ServerCookie::new("next", "x; Domain=evil.example");
    /// assert_eq!(forged.to_set_cookie_header().unwrap_err().kind(), ErrorKind::InvalidCookie);
    /// ```
    pub fn to_set_cookie_header(&self) -> Result<String, Error> {
        if self.name.is_empty() || !self.name.bytes().all(is_token_byte) {
            return Err(Error::with_message(
                ErrorKind::InvalidCookie,
                format!("cookie name '{}' is not a token", self.name),
            ));
        }
        if !is_cookie_value(&self.value) {
            return Err(Error::with_message(
                ErrorKind::InvalidCookie,
                format!("value of cookie '{}' contains separators", self.name),
            ));
        }

        let mut header = format!("{}={}", self.name, self.value);
        let attributes = [
            ("Comment", &self.comment),
            ("Domain", &self.domain),
            ("Path", &self.path),
        ];
        for (attribute, value) in attributes {
            let Some(value) = value else { continue };
            if !value.bytes().all(is_attribute_byte) {
                return Err(Error::with_message(
                    ErrorKind::InvalidCookie,
                    format!("{} of cookie '{}' contains separators", attribute, self.name),
                ));
            }
            // Writing to a String cannot fail.
            let _ = write!(header, "; {}={}", attribute, value);
        }
        if let Some(max_age) = self.max_age {
            let _ = write!(header, "; Max-Age={}", max_age);
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        Ok(header)
    }
}

// RFC 7230 tchar
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

// RFC 6265 cookie-octet: visible ASCII minus DQUOTE, comma, semicolon and backslash
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn is_cookie_value(value: &str) -> bool {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    inner.bytes().all(is_cookie_octet)
}

// RFC 6265 av-octet: any ASCII except controls and semicolon
fn is_attribute_byte(b: u8) -> bool {
    b.is_ascii() && !b.is_ascii_control() && b != b';'
}

/// Parses a request `Cookie` header into name/value cookies.
///
/// Pairs without `=` or with an empty name are skipped. Values wrapped in
/// double quotes are unquoted.
///
/// # Examples
///
/// ```
/// use webcontext_core::exchange::parse_cookie_header;
///
/// let cookies = parse_cookie_header("a=1; b=\"two\"; broken; =x");
/// assert_eq!(cookies.len(), 2);
/// assert_eq!(cookies[1].value, "two");
/// ```
pub fn parse_cookie_header(header: &str) -> Vec<ServerCookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some(ServerCookie::new(name, value))
        })
        .collect()
}
