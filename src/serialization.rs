//! Text encoding for values stored in string-only exchange slots.
//!
//! Values are rendered as JSON and then wrapped in standard base64 so they can
//! live in places that only accept plain strings, such as path parameters.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, ErrorKind};

/// Encodes a serializable value as base64 text.
///
/// # Errors
///
/// Returns `ErrorKind::Serialization` if the value cannot be represented as
/// JSON (for example a map with non-string keys).
///
/// # Examples
///
/// ```
/// use webcontext_core::serialization::{deserialize_from_base64, serialize_to_base64};
///
/// let encoded = serialize_to_base64(&vec!["a", "b"]).unwrap();
/// let decoded: Vec<String> = deserialize_from_base64(&encoded).unwrap();
/// assert_eq!(decoded, vec!["a", "b"]);
/// ```
pub fn serialize_to_base64<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)
        .map_err(|e| Error::with_message(ErrorKind::Serialization, e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decodes base64 text produced by [`serialize_to_base64`].
///
/// # Errors
///
/// Returns `ErrorKind::Deserialization` if the text is not valid base64 or the
/// decoded JSON does not match `T`.
pub fn deserialize_from_base64<T: DeserializeOwned>(text: &str) -> Result<T, Error> {
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| Error::with_message(ErrorKind::Deserialization, e.to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::with_message(ErrorKind::Deserialization, e.to_string()))
}
