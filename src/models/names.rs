//! Validated identifiers for buckets and objects.
//!
//! Both types are checked once at the edge (config loading, HTTP path
//! extraction) so the gateway can assume well-formed input.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: &'static str },
    #[error("object key `{key}` invalid: {reason}")]
    InvalidObjectKey { key: String, reason: &'static str },
}

/// Name of a bucket in the object store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BucketName(String);

impl BucketName {
    /// Validate `name` against S3 bucket naming rules:
    /// - 3–63 characters
    /// - lowercase letters, digits, dots, hyphens only
    /// - starts and ends with a letter or digit
    /// - no consecutive dots or dot-hyphen patterns
    /// - not shaped like an IPv4 address
    pub fn parse(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        let invalid = |reason| NameError::InvalidBucketName {
            name: name.clone(),
            reason,
        };

        if name.trim() != name {
            return Err(invalid("cannot begin or end with whitespace"));
        }

        let len = name.len();
        if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
            return Err(invalid("must be between 3 and 63 characters"));
        }

        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            return Err(invalid(
                "allowed characters are lowercase letters, digits, dots, and hyphens",
            ));
        }

        if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
            return Err(invalid("must start and end with a lowercase letter or digit"));
        }

        if name.contains("..") || name.contains("-.") || name.contains(".-") {
            return Err(invalid(
                "cannot contain consecutive dots or dot-hyphen combinations",
            ));
        }

        if is_ipv4_like(&name) {
            return Err(invalid("must not be formatted like an IP address"));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of an object within a bucket. Here it is always the uploaded file name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Reject empty or oversized keys and keys with control characters.
    ///
    /// Keys only ever address objects in the store, so `..`, `/` and `\`
    /// are ordinary characters here.
    pub fn parse(key: impl Into<String>) -> Result<Self, NameError> {
        let key = key.into();
        let invalid = |reason| NameError::InvalidObjectKey {
            key: key.clone(),
            reason,
        };

        if key.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if key.len() > MAX_OBJECT_KEY_LEN {
            return Err(invalid("must be at most 1024 bytes"));
        }
        if key.bytes().any(|b| b.is_ascii_control()) {
            return Err(invalid("must not contain control characters"));
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased extension after the last `.` of the final path segment.
    pub fn extension(&self) -> Option<String> {
        let file_name = self.0.rsplit('/').next().unwrap_or(&self.0);
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
