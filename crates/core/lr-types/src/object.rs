//! Object listing entries.

use serde::{Deserialize, Serialize};

use crate::SEPARATOR;

/// An object as reported by a listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// Full object key within the bucket
    pub key: String,

    /// Size of the object in bytes
    pub size: u64,
}

impl ObjectSummary {
    /// Create a new object summary.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// The final path component of the key.
    pub fn basename(&self) -> &str {
        basename(&self.key)
    }
}

/// Returns the part of `key` after the last separator.
pub fn basename(key: &str) -> &str {
    match key.rfind(SEPARATOR) {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}
