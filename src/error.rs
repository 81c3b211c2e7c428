//! Crate level errors.
//!
//! Every decode step returns a [`Result`]. Nothing in the engine recovers or
//! retries locally: the first failure is surfaced to the caller with the name
//! of the field (or decoding step) it came from attached.
//!
//! # Error Hierarchy
//!
//! ## Cursor errors
//!
//! - [`Error::Underflow`]: not enough bytes before the window limit
//! - [`Error::OutOfBounds`]: a position or limit outside the window
//! - [`Error::InvalidMark`]: `reset()` without a mark
//!
//! ## Wire errors
//!
//! - [`Error::NegativeLength`]: a non-nullable length/count prefix was negative
//! - [`Error::UnsupportedVersion`] / [`Error::UnknownVersion`]: version tag with no schema
//!
//! ## Schema errors
//!
//! - [`Error::DuplicateField`] / [`Error::UnknownField`]: catalog construction or lookup misuse
//! - [`Error::SchemaMismatch`]: a field handle used on a record from another schema
//! - [`Error::MissingRequiredField`]: non-nullable field absent with no default
//! - [`Error::TypeMismatch`]: stored value kind disagrees with the accessor
//! - [`Error::FieldCount`]: record built with the wrong number of values
//!
//! ## Context
//!
//! [`Error::Field`] wraps a cause with the field or step that produced it and
//! renders as `error reading field 'X': <cause>`. Use [`Error::root`] to get at
//! the originating error.

use std::result;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

/// Decoding errors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Fewer bytes remain before the limit than the read needs.
    #[error("buffer underflow: needed {needed} bytes, {remaining} remaining")]
    Underflow { needed: usize, remaining: usize },

    /// A non-nullable length or count prefix was negative.
    #[error("{what} length {length} cannot be negative")]
    NegativeLength { what: &'static str, length: i32 },

    /// The version tag is below the minimum supported version.
    #[error("unsupported {what} version: {version}")]
    UnsupportedVersion { what: &'static str, version: i16 },

    /// No schema is registered for the version tag.
    #[error("unknown {what} version: {version}")]
    UnknownVersion { what: &'static str, version: i16 },

    /// Two fields of one schema share a name.
    #[error("schema contains a duplicate field: {0}")]
    DuplicateField(String),

    /// The schema has no field with that name.
    #[error("invalid field name: {0}")]
    UnknownField(String),

    /// A bound field was used against a record of a different schema instance.
    #[error("attempt to access field '{0}' from a different schema instance")]
    SchemaMismatch(String),

    /// A non-nullable field holds no value and declares no default.
    #[error("missing value for field '{0}' which has no default value")]
    MissingRequiredField(String),

    /// The stored value does not have the kind the accessor asked for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A record was built with a value count that differs from its schema.
    #[error("record has {actual} values but its schema has {expected} fields")]
    FieldCount { expected: usize, actual: usize },

    /// A position or limit outside what the window allows.
    #[error("illegal {what} {requested}, bound is {bound}")]
    OutOfBounds {
        what: &'static str,
        requested: usize,
        bound: usize,
    },

    /// `reset()` called on a window with no mark set.
    #[error("window has no mark to reset to")]
    InvalidMark,

    /// A failure while reading a named field or decoding step.
    #[error("error reading field '{field}': {source}")]
    Field { field: String, source: Box<Error> },
}

impl Error {
    /// Attach the field or step name that produced this error.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Error::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// The originating error, with all field context stripped.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Error::Field { source, .. } = err {
            err = source;
        }
        err
    }

    /// Field names from the outermost context inwards.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut err = self;
        while let Error::Field { field, source } = err {
            path.push(field.as_str());
            err = source;
        }
        path
    }
}

/// Extension for attaching field context to a `Result`.
pub(crate) trait ResultExt<T> {
    fn in_field(self, field: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn in_field(self, field: &str) -> Result<T> {
        self.map_err(|e| e.in_field(field))
    }
}
