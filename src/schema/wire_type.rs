//! The closed set of wire types.
//!
//! | Type | Wire layout | Negative prefix |
//! |------|-------------|-----------------|
//! | `INT16`/`INT32`/`INT64` | fixed width, big-endian | n/a |
//! | `STRING` | i16 length + bytes | error |
//! | `NULLABLE_STRING` | i16 length + bytes | absent |
//! | `BYTES` | i32 length + bytes | error |
//! | `NULLABLE_BYTES` | i32 length + bytes | absent |
//! | `ARRAY(T)` | i32 count + count x T | absent if nullable, else error |
//! | `STRUCT` | the nested schema's fields in order | n/a |

use std::fmt;
use std::sync::Arc;

use super::{Schema, Value};
use crate::buffer::ByteWindow;
use crate::constants::MAX_PROTOCOL_ARRAY_SIZE;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum WireType {
    Int16,
    Int32,
    Int64,
    String,
    NullableString,
    Bytes,
    NullableBytes,
    ArrayOf {
        element: Box<WireType>,
        nullable: bool,
        max_len: usize,
    },
    Struct(Arc<Schema>),
}

impl WireType {
    /// A non-nullable array of `element`.
    pub fn array_of(element: WireType) -> Self {
        WireType::ArrayOf {
            element: Box::new(element),
            nullable: false,
            max_len: MAX_PROTOCOL_ARRAY_SIZE,
        }
    }

    /// A nullable array of `element`.
    pub fn nullable_array_of(element: WireType) -> Self {
        WireType::ArrayOf {
            element: Box::new(element),
            nullable: true,
            max_len: MAX_PROTOCOL_ARRAY_SIZE,
        }
    }

    /// Cap the element count an array accepts. No effect on other types.
    pub fn with_max_len(self, max_len: usize) -> Self {
        match self {
            WireType::ArrayOf {
                element, nullable, ..
            } => WireType::ArrayOf {
                element,
                nullable,
                max_len,
            },
            other => other,
        }
    }

    /// Decode one value at the window's position.
    pub fn read(&self, window: &mut ByteWindow) -> Result<Value> {
        match self {
            WireType::Int16 => Ok(Value::Int16(window.read_i16()?)),
            WireType::Int32 => Ok(Value::Int32(window.read_i32()?)),
            WireType::Int64 => Ok(Value::Int64(window.read_i64()?)),
            WireType::String => {
                let length = window.read_i16()?;
                if length < 0 {
                    return Err(Error::NegativeLength {
                        what: "string",
                        length: i32::from(length),
                    });
                }
                Ok(Value::Text(window.read_string(length as usize)?))
            }
            WireType::NullableString => {
                let length = window.read_i16()?;
                if length < 0 {
                    return Ok(Value::Absent);
                }
                Ok(Value::Text(window.read_string(length as usize)?))
            }
            WireType::Bytes => {
                let size = window.read_i32()?;
                if size < 0 {
                    return Err(Error::NegativeLength {
                        what: "bytes",
                        length: size,
                    });
                }
                read_blob(window, size as usize)
            }
            WireType::NullableBytes => {
                let size = window.read_i32()?;
                if size < 0 {
                    return Ok(Value::Absent);
                }
                read_blob(window, size as usize)
            }
            WireType::ArrayOf {
                element,
                nullable,
                max_len,
            } => {
                let count = window.read_i32()?;
                if count < 0 {
                    if *nullable {
                        return Ok(Value::Absent);
                    }
                    return Err(Error::NegativeLength {
                        what: "array",
                        length: count,
                    });
                }
                let count = count as usize;
                // Every element takes at least one byte, so this only rejects
                // counts that cannot possibly fit.
                let remaining = window.remaining();
                if count > remaining {
                    return Err(Error::Underflow {
                        needed: count,
                        remaining,
                    });
                }
                if count > *max_len {
                    return Err(Error::OutOfBounds {
                        what: "array length",
                        requested: count,
                        bound: *max_len,
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(element.read(window)?);
                }
                Ok(Value::Array(items))
            }
            WireType::Struct(schema) => Ok(Value::Struct(schema.read(window)?)),
        }
    }

    /// Check that `value` is something this type could have produced.
    pub fn validate(&self, value: &Value) -> Result<()> {
        match (self, value) {
            (WireType::Int16, Value::Int16(_))
            | (WireType::Int32, Value::Int32(_))
            | (WireType::Int64, Value::Int64(_))
            | (WireType::String, Value::Text(_))
            | (WireType::NullableString, Value::Text(_) | Value::Absent)
            | (WireType::Bytes, Value::Bytes(_))
            | (WireType::NullableBytes, Value::Bytes(_) | Value::Absent) => Ok(()),
            (WireType::ArrayOf { nullable: true, .. }, Value::Absent) => Ok(()),
            (WireType::ArrayOf { element, .. }, Value::Array(items)) => {
                items.iter().try_for_each(|item| element.validate(item))
            }
            (WireType::Struct(schema), Value::Struct(record)) => schema.validate(record),
            (ty, value) => Err(Error::TypeMismatch {
                expected: ty.type_name(),
                found: value.kind(),
            }),
        }
    }

    /// Encoded size of `value` in bytes.
    ///
    /// Advisory only; fixed-width types do not inspect the value.
    pub fn size_of(&self, value: &Value) -> Result<usize> {
        match (self, value) {
            (WireType::Int16, _) => Ok(2),
            (WireType::Int32, _) => Ok(4),
            (WireType::Int64, _) => Ok(8),
            (WireType::String | WireType::NullableString, Value::Text(s)) => Ok(2 + s.len()),
            (WireType::NullableString, Value::Absent) => Ok(2),
            (WireType::Bytes | WireType::NullableBytes, Value::Bytes(w)) => Ok(4 + w.remaining()),
            (WireType::NullableBytes, Value::Absent) => Ok(4),
            (WireType::ArrayOf { .. }, Value::Absent) => Ok(4),
            (WireType::ArrayOf { element, .. }, Value::Array(items)) => items
                .iter()
                .try_fold(4, |acc, item| Ok(acc + element.size_of(item)?)),
            (WireType::Struct(schema), Value::Struct(record)) => schema.size_of(record),
            (ty, value) => Err(Error::TypeMismatch {
                expected: ty.type_name(),
                found: value.kind(),
            }),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            WireType::NullableString | WireType::NullableBytes => true,
            WireType::ArrayOf { nullable, .. } => *nullable,
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            WireType::Int16 => "INT16",
            WireType::Int32 => "INT32",
            WireType::Int64 => "INT64",
            WireType::String => "STRING",
            WireType::NullableString => "NULLABLE_STRING",
            WireType::Bytes => "BYTES",
            WireType::NullableBytes => "NULLABLE_BYTES",
            WireType::ArrayOf { .. } => "ARRAY",
            WireType::Struct(_) => "STRUCT",
        }
    }
}

/// Window exactly `size` bytes at the cursor and step the parent past them.
fn read_blob(window: &mut ByteWindow, size: usize) -> Result<Value> {
    let blob = window.slice_len(size)?;
    window.advance(size)?;
    Ok(Value::Bytes(blob))
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::ArrayOf { element, .. } => write!(f, "ARRAY({element})"),
            other => f.write_str(other.type_name()),
        }
    }
}
