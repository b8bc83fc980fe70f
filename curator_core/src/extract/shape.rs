use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Object keys that models use to wrap the list they were asked for.
pub const WRAPPER_KEYS: &[&str] = &[
    "clusters", "groups", "data", "result", "results", "output", "ids", "selected",
];

/// The kind of value a response parsed to.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Array(Vec<Value>),
    /// An object with exactly one wrapper key holding an array.
    Wrapped {
        key: &'static str,
        items: Vec<Value>,
    },
    Object(Map<String, Value>),
    Scalar(Value),
}

impl Shape {
    #[must_use]
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Array(items),
            Value::Object(mut map) => {
                let wrappers: Vec<&'static str> = WRAPPER_KEYS
                    .iter()
                    .copied()
                    .filter(|key| map.get(*key).is_some_and(Value::is_array))
                    .collect();

                match wrappers.as_slice() {
                    [key] => match map.remove(*key) {
                        Some(Value::Array(items)) => Self::Wrapped { key: *key, items },
                        _ => Self::Object(map),
                    },
                    _ => Self::Object(map),
                }
            }
            other => Self::Scalar(other),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Array(_) => "array",
            Self::Wrapped { .. } => "wrapped array",
            Self::Object(_) => "object",
            Self::Scalar(_) => "scalar",
        }
    }

    /// The list carried by this value, if it carries one.
    ///
    /// # Errors
    /// [`Error::ShapeMismatch`] for plain objects and scalars.
    pub fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Self::Array(items) | Self::Wrapped { items, .. } => Ok(items),
            other => Err(Error::ShapeMismatch {
                expected: "array",
                found: other.kind(),
            }),
        }
    }
}
