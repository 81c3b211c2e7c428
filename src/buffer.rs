//! Bounded byte cursor over shared storage.
//!
//! A [`ByteWindow`] is a `position`/`limit`/`capacity` view into a [`Bytes`]
//! region. Reads happen at `position` and advance it; nothing may be read past
//! `limit`. [`ByteWindow::slice`] creates an independent cursor over the
//! remaining bytes without copying: the storage is shared, the cursor state is
//! not.
//!
//! ```text
//! storage:  [ .............................................. ]
//!                 ^ base_offset
//! window:         [ 0 ...... position ...... limit .. capacity ]
//! ```
//!
//! All integers are big-endian two's complement.

use bytes::Bytes;
use nom::error::Error as NomError;
use nom::number::complete::{be_i16, be_i32, be_i64};
use std::fmt;

use crate::error::{Error, Result};

/// A bounded, zero-copy read cursor.
///
/// Invariant: `position <= limit <= capacity` and
/// `base_offset + capacity <= storage.len()`.
#[derive(Clone)]
pub struct ByteWindow {
    storage: Bytes,
    mark: Option<usize>,
    position: usize,
    limit: usize,
    capacity: usize,
    base_offset: usize,
}

impl ByteWindow {
    /// Wrap a byte region. The window covers all of it.
    pub fn wrap(data: impl Into<Bytes>) -> Self {
        let storage = data.into();
        let capacity = storage.len();
        Self {
            storage,
            mark: None,
            position: 0,
            limit: capacity,
            capacity,
            base_offset: 0,
        }
    }

    /// An empty window.
    pub fn empty() -> Self {
        Self::wrap(Bytes::new())
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes left between `position` and `limit`.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Move the cursor. Fails if `position > limit`; drops a mark past the new position.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::OutOfBounds {
                what: "position",
                requested: position,
                bound: self.limit,
            });
        }
        self.position = position;
        if self.mark.is_some_and(|m| m > position) {
            self.mark = None;
        }
        Ok(())
    }

    /// Change the limit. Fails if `limit > capacity`; clamps position and mark down.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(Error::OutOfBounds {
                what: "limit",
                requested: limit,
                bound: self.capacity,
            });
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|m| m > limit) {
            self.mark = None;
        }
        Ok(())
    }

    /// Skip `count` bytes.
    pub fn advance(&mut self, count: usize) -> Result<()> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(Error::Underflow {
                needed: count,
                remaining,
            });
        }
        self.position += count;
        Ok(())
    }

    /// Remember the current position.
    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// Return to the marked position.
    pub fn reset(&mut self) -> Result<()> {
        let mark = self.mark.ok_or(Error::InvalidMark)?;
        self.position = mark;
        Ok(())
    }

    /// A new cursor over the remaining bytes, sharing storage with `self`.
    ///
    /// The slice starts at position 0 with `limit == capacity == self.remaining()`.
    /// Later moves of either cursor do not affect the other.
    pub fn slice(&self) -> ByteWindow {
        let remaining = self.remaining();
        ByteWindow {
            storage: self.storage.clone(),
            mark: None,
            position: 0,
            limit: remaining,
            capacity: remaining,
            base_offset: self.base_offset + self.position,
        }
    }

    /// A new cursor over exactly the next `length` bytes, sharing storage with `self`.
    ///
    /// The result has `limit == capacity == length`; `self` does not move.
    pub fn slice_len(&self, length: usize) -> Result<ByteWindow> {
        let remaining = self.remaining();
        if length > remaining {
            return Err(Error::Underflow {
                needed: length,
                remaining,
            });
        }
        Ok(ByteWindow {
            storage: self.storage.clone(),
            mark: None,
            position: 0,
            limit: length,
            capacity: length,
            base_offset: self.base_offset + self.position,
        })
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let remaining = self.remaining();
        let (_, value) = be_i16::<_, NomError<&[u8]>>(self.as_slice()).map_err(|_| {
            Error::Underflow {
                needed: 2,
                remaining,
            }
        })?;
        self.position += 2;
        Ok(value)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let remaining = self.remaining();
        let (_, value) = be_i32::<_, NomError<&[u8]>>(self.as_slice()).map_err(|_| {
            Error::Underflow {
                needed: 4,
                remaining,
            }
        })?;
        self.position += 4;
        Ok(value)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let remaining = self.remaining();
        let (_, value) = be_i64::<_, NomError<&[u8]>>(self.as_slice()).map_err(|_| {
            Error::Underflow {
                needed: 8,
                remaining,
            }
        })?;
        self.position += 8;
        Ok(value)
    }

    /// Read `length` bytes as text and advance past them.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD; text content never fails a decode.
    pub fn read_string(&mut self, length: usize) -> Result<String> {
        let bytes = self.take(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// The remaining bytes, borrowed.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.base_offset + self.position..self.base_offset + self.limit]
    }

    /// The remaining bytes as a shared `Bytes` handle (no copy).
    pub fn to_bytes(&self) -> Bytes {
        self.storage
            .slice(self.base_offset + self.position..self.base_offset + self.limit)
    }

    fn take(&mut self, count: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(Error::Underflow {
                needed: count,
                remaining,
            });
        }
        let start = self.base_offset + self.position;
        self.position += count;
        Ok(&self.storage[start..start + count])
    }
}

impl Default for ByteWindow {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for ByteWindow {
    fn from(bytes: Bytes) -> Self {
        Self::wrap(bytes)
    }
}

impl From<Vec<u8>> for ByteWindow {
    fn from(bytes: Vec<u8>) -> Self {
        Self::wrap(bytes)
    }
}

impl From<&'static [u8]> for ByteWindow {
    fn from(bytes: &'static [u8]) -> Self {
        Self::wrap(bytes)
    }
}

/// Two windows are equal when their remaining bytes are equal.
impl PartialEq for ByteWindow {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteWindow {}

impl fmt::Debug for ByteWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteWindow")
            .field("position", &self.position)
            .field("limit", &self.limit)
            .field("capacity", &self.capacity)
            .field("base_offset", &self.base_offset)
            .field("remaining", &self.as_slice())
            .finish()
    }
}
