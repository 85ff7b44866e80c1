/// A framework-agnostic cookie.
///
/// This is the cookie shape the web context hands to and receives from
/// authentication code. Server bindings convert it to and from their native
/// cookie type without dropping any attribute.
///
/// # Examples
///
/// ```
/// use webcontext_core::Cookie;
///
/// let cookie = Cookie::new("remember", "yes")
///     .with_path("/")
///     .with_max_age(3600)
///     .with_http_only(true);
///
/// assert_eq!(cookie.name(), "remember");
/// assert_eq!(cookie.max_age(), Some(3600));
/// assert!(cookie.is_http_only());
/// assert!(!cookie.is_secure());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    comment: Option<String>,
    domain: Option<String>,
    path: Option<String>,
    max_age: Option<i64>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    /// Creates a cookie with only a name and value set.
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

    /// Sets the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the max-age in seconds.
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the secure flag.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the http-only flag.
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Comment, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Domain, if any.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Path, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Max-age in seconds, if any.
    pub fn max_age(&self) -> Option<i64> {
        self.max_age
    }

    /// Whether the cookie is restricted to secure transports.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Whether the cookie is hidden from scripts.
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub(crate) fn set_domain(&mut self, domain: Option<String>) {
        self.domain = domain;
    }

    pub(crate) fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    pub(crate) fn set_max_age(&mut self, max_age: Option<i64>) {
        self.max_age = max_age;
    }
}
