//! Attribute value type for Vahti transactions
//!
//! Attributes recorded on a transaction are loosely typed - request metadata
//! is mostly strings, response status is numeric, feature flags are booleans.
//! [`AttributeValue`] is the small tagged union that carries them all through
//! the store and the filter engine while staying type-safe.

use serde::Serialize;
use std::fmt;

/// A single attribute value
///
/// Serializes untagged, so a finalized attribute view renders as plain JSON:
/// `{"request.method": "GET", "response.status": 200}`.
///
/// # Example
///
/// ```
/// use vahti_core::AttributeValue;
///
/// let status = AttributeValue::from(200_i64);
/// assert_eq!(status.as_int(), Some(200));
/// assert_eq!(status.to_string(), "200");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// UTF-8 string (header values, route/query parameters)
    Str(String),
    /// Signed integer (status codes, counts)
    Int(i64),
    /// Floating point (durations, thresholds)
    Float(f64),
    /// Boolean flag
    Bool(bool),
}

impl AttributeValue {
    /// Get the string value if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer value if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the float value if this is a `Float`
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the boolean value if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => write!(f, "{}", s),
            AttributeValue::Int(n) => write!(f, "{}", n),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Str(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Int(n)
    }
}

impl From<u16> for AttributeValue {
    fn from(n: u16) -> Self {
        AttributeValue::Int(i64::from(n))
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl PartialEq<str> for AttributeValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for AttributeValue {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<i64> for AttributeValue {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<i64> for &AttributeValue {
    fn eq(&self, other: &i64) -> bool {
        (**self).eq(other)
    }
}
