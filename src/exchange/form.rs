use std::collections::{BTreeMap, VecDeque};

/// Parsed form fields attached to an exchange.
///
/// Each field name maps to its values in submission order. The exchange only
/// carries a `FormData` attachment when the request body was form-encoded.
///
/// # Examples
///
/// ```
/// use webcontext_core::FormData;
///
/// let form = FormData::parse_urlencoded(b"user=alice&role=a&role=b");
/// assert_eq!(form.first("user"), Some("alice"));
/// assert_eq!(form.get("role").map(|v| v.len()), Some(2));
/// assert!(form.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, VecDeque<String>>,
}

impl FormData {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn parse_urlencoded(body: &[u8]) -> Self {
        let mut form = Self::new();
        for (name, value) in url::form_urlencoded::parse(body) {
            form.add(name.into_owned(), value.into_owned());
        }
        form
    }

    /// Appends a value for a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields
            .entry(name.into())
            .or_default()
            .push_back(value.into());
    }

    /// Returns every value submitted for a field.
    pub fn get(&self, name: &str) -> Option<&VecDeque<String>> {
        self.fields.get(name)
    }

    /// Returns the first value submitted for a field.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.front().map(String::as_str)
    }

    /// Iterates over field names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates over fields and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VecDeque<String>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if no fields were submitted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
