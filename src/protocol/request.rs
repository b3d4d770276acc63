//! Request definitions
//!
//! A validated top-level request: command name plus arguments.

use bytes::Bytes;
use thiserror::Error;

use super::Value;

/// Why a decoded value cannot be executed as a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("expected array, got {0}")]
    NotArray(&'static str),

    #[error("expected array length > 0")]
    Empty,

    #[error("element {index} is {kind}, expected bulk string")]
    InvalidElement { index: usize, kind: &'static str },
}

/// A client request as it travels through the engine and into the AOF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    name: Bytes,
    args: Vec<Bytes>,
}

impl Request {
    /// Build a request from a command name and arguments
    pub fn new<I, A>(name: impl Into<Bytes>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Bytes>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate a decoded value as a request.
    ///
    /// Elements may be bulk strings or simple strings; anything else is
    /// rejected.
    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(RequestError::NotArray(other.type_name())),
        };
        if items.is_empty() {
            return Err(RequestError::Empty);
        }

        let mut parts = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Bulk(data) => parts.push(data),
                Value::SimpleString(text) => parts.push(Bytes::from(text)),
                other => {
                    return Err(RequestError::InvalidElement {
                        index,
                        kind: other.type_name(),
                    })
                }
            }
        }

        let name = parts.remove(0);
        Ok(Self { name, args: parts })
    }

    /// Command name exactly as the client sent it
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// Re-encode as an array of bulk strings (the AOF record form)
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Value::Bulk(self.name.clone()));
        items.extend(self.args.iter().cloned().map(Value::Bulk));
        Value::Array(items)
    }
}
