//! Decoded values.
//!
//! A [`Value`] is what a [`WireType`](super::WireType) produces from the wire.
//! The `as_*` coercions are the typed-extraction helpers the decoder uses:
//! they fail with [`Error::TypeMismatch`] when the value is of another kind and
//! never convert between kinds.

use std::fmt;

use super::Record;
use crate::buffer::ByteWindow;
use crate::error::{Error, Result};

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null on the wire (negative length/count on a nullable type).
    #[default]
    Absent,
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Text(String),
    /// Zero-copy view of a byte blob inside the decoded buffer.
    Bytes(ByteWindow),
    Array(Vec<Value>),
    Struct(Record),
}

impl Value {
    /// Kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "ABSENT",
            Value::Int16(_) => "INT16",
            Value::Int32(_) => "INT32",
            Value::Int64(_) => "INT64",
            Value::Text(_) => "STRING",
            Value::Bytes(_) => "BYTES",
            Value::Array(_) => "ARRAY",
            Value::Struct(_) => "STRUCT",
        }
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_int16(&self) -> Result<i16> {
        match self {
            Value::Int16(v) => Ok(*v),
            other => Err(mismatch("INT16", other)),
        }
    }

    pub fn as_int32(&self) -> Result<i32> {
        match self {
            Value::Int32(v) => Ok(*v),
            other => Err(mismatch("INT32", other)),
        }
    }

    pub fn as_int64(&self) -> Result<i64> {
        match self {
            Value::Int64(v) => Ok(*v),
            other => Err(mismatch("INT64", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Text(v) => Ok(v),
            other => Err(mismatch("STRING", other)),
        }
    }

    pub fn as_string(&self) -> Result<String> {
        self.as_str().map(str::to_owned)
    }

    pub fn as_byte_window(&self) -> Result<&ByteWindow> {
        match self {
            Value::Bytes(v) => Ok(v),
            other => Err(mismatch("BYTES", other)),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(v) => Ok(v),
            other => Err(mismatch("ARRAY", other)),
        }
    }

    pub fn as_record(&self) -> Result<&Record> {
        match self {
            Value::Struct(v) => Ok(v),
            other => Err(mismatch("STRUCT", other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<ByteWindow> for Value {
    fn from(v: ByteWindow) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Struct(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Absent, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "null"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.remaining()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Struct(record) => write!(f, "{record}"),
        }
    }
}
