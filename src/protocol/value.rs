//! Value definitions
//!
//! The tagged value carried by every frame, in both directions.

use bytes::Bytes;

/// A single protocol value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Status reply, e.g. `OK` or `PONG`. Must not contain CR or LF.
    SimpleString(String),

    /// Error reply. Must not contain CR or LF.
    Error(String),

    /// Signed 64-bit integer
    Integer(i64),

    /// Length-prefixed, binary-safe string (may be empty)
    Bulk(Bytes),

    /// Null bulk string, used for "not found"
    Null,

    /// Ordered sequence of values (may be empty)
    Array(Vec<Value>),
}

impl Value {
    /// The `+OK` status reply
    pub fn ok() -> Self {
        Value::SimpleString("OK".to_string())
    }

    pub fn simple(text: impl Into<String>) -> Self {
        Value::SimpleString(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::Bulk(data.into())
    }

    /// Whether this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Short type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::SimpleString(_) => "simple string",
            Value::Error(_) => "error",
            Value::Integer(_) => "integer",
            Value::Bulk(_) => "bulk string",
            Value::Null => "null",
            Value::Array(_) => "array",
        }
    }
}
