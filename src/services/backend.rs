//! The seam between the gateway and a concrete object store.
//!
//! Implementations perform exactly one wire round trip per call and report
//! failures as [`BackendError`]; classification into the public taxonomy is
//! the gateway's job.

use crate::models::{
    names::{BucketName, ObjectKey},
    object::ObjectStream,
};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::{io, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("bucket `{0}` is already owned by you")]
    BucketAlreadyOwned(String),
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Content to store under a key.
#[derive(Debug)]
pub struct UploadBody {
    pub content: ByteStream,
    /// Base64 MD5 of the content, forwarded as `Content-MD5` so the store can
    /// verify the payload.
    pub content_md5: Option<String>,
    pub content_type: Option<String>,
}

impl UploadBody {
    pub fn new(content: ByteStream) -> Self {
        Self {
            content,
            content_md5: None,
            content_type: None,
        }
    }

    /// Wrap an in-memory payload and compute its Content-MD5 digest.
    pub fn from_bytes(bytes: Bytes) -> Self {
        let digest = md5::compute(&bytes);
        Self {
            content_md5: Some(general_purpose::STANDARD.encode(digest.0)),
            ..Self::new(ByteStream::from(bytes))
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }
}

/// One page of a bucket listing.
#[derive(Debug, Default)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    /// Present while the store has more keys to return.
    pub next_continuation_token: Option<String>,
}

/// An object opened for reading.
#[derive(Debug)]
pub struct FetchedObject {
    pub content: ObjectStream,
    pub content_length: Option<u64>,
}

#[async_trait]
pub trait ObjectBackend: Send + Sync + 'static {
    async fn list_bucket_names(&self) -> Result<Vec<String>, BackendError>;

    /// Create `bucket`. Reports [`BackendError::BucketAlreadyOwned`] when the
    /// caller already owns a bucket of that name.
    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), BackendError>;

    /// Store `body` under `key`, replacing any existing object. Returns the ETag.
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: UploadBody,
    ) -> Result<Option<String>, BackendError>;

    async fn list_objects_page(
        &self,
        bucket: &BucketName,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError>;

    async fn get_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> Result<FetchedObject, BackendError>;
}
