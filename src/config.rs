//! Decoder configuration.
//!
//! # Environment Variables
//!
//! - `OFFSETS_PROMOTE_SCALAR_ARRAYS`: `true`/`false` (default: `true`)
//! - `OFFSETS_MAX_ARRAY_LEN`: upper bound on any decoded array count
//!   (default: 1,000,000)
//!
//! Unparseable values fall back to the default.

use crate::constants::MAX_PROTOCOL_ARRAY_SIZE;

pub const PROMOTE_SCALAR_ARRAYS_ENV: &str = "OFFSETS_PROMOTE_SCALAR_ARRAYS";
pub const MAX_ARRAY_LEN_ENV: &str = "OFFSETS_MAX_ARRAY_LEN";

/// Configuration shared by the schema catalog and the decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Accept a lone INT32 where an array is expected, as a one-element array.
    ///
    /// When false such a value is a type mismatch.
    ///
    /// Default: true
    pub promote_scalar_arrays: bool,

    /// Largest element count any array may declare.
    ///
    /// Applies on top of the check that the count fits in the remaining bytes.
    ///
    /// Default: 1,000,000
    pub max_array_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            promote_scalar_arrays: true,
            max_array_len: MAX_PROTOCOL_ARRAY_SIZE,
        }
    }
}

impl DecoderConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let promote_scalar_arrays = lookup(PROMOTE_SCALAR_ARRAYS_ENV)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.promote_scalar_arrays);

        let max_array_len = lookup(MAX_ARRAY_LEN_ENV)
            .and_then(|v| v.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.max_array_len);

        Self {
            promote_scalar_arrays,
            max_array_len,
        }
    }

    pub fn with_promote_scalar_arrays(mut self, promote: bool) -> Self {
        self.promote_scalar_arrays = promote;
        self
    }

    pub fn with_max_array_len(mut self, max_array_len: usize) -> Self {
        self.max_array_len = max_array_len;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
