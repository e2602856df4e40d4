//! `s3://bucket/key` locations.

use lr_error::TaskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SCHEME: &str = "s3://";

/// A location in an object store, addressed by bucket and key.
///
/// The key may be empty (bucket root), end with a separator (a directory-like
/// prefix) or be a literal key prefix such as `example.com/2022-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct S3Uri {
    bucket: String,
    key: String,
}

impl S3Uri {
    /// Parse an `s3://bucket/key` URI.
    pub fn parse(uri: &str) -> Result<Self, TaskError> {
        let rest = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| TaskError::InvalidUri(uri.to_string()))?;

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(TaskError::InvalidUri(uri.to_string()));
        }

        Ok(Self::from_segments(bucket, key))
    }

    /// Build a URI from its bucket and key.
    pub fn from_segments(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key within the bucket (no leading separator).
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", SCHEME, self.bucket, self.key)
    }
}

impl FromStr for S3Uri {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for S3Uri {
    type Error = TaskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<S3Uri> for String {
    fn from(uri: S3Uri) -> Self {
        uri.to_string()
    }
}
