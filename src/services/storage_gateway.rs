//! StorageGateway: the single point of contact with the object store.
//!
//! Every public operation is one independent round trip (bucket provisioning
//! is two) and returns a [`StorageResult`]. Backend faults never cross this
//! boundary: they are logged here with their source and converted into a
//! [`StorageError`] whose only classification is "not found" or not.

use crate::{
    models::{
        failure::FailureDetail,
        names::{BucketName, ObjectKey},
        object::{DownloadOutcome, ListingOutcome, UploadOutcome, content_type_for},
    },
    services::backend::{BackendError, ObjectBackend, UploadBody},
};
use std::{fmt, future::Future, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info};

/// Which gateway operation a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    EnsureBucket,
    Upload,
    List,
    Download,
    Ping,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::EnsureBucket => "creating bucket",
            Operation::Upload => "uploading file",
            Operation::List => "listing files",
            Operation::Download => "downloading file",
            Operation::Ping => "checking store",
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file `{key}` was not found")]
    NotFound { key: String },
    #[error("storage error while {operation}: {message}")]
    Protocol {
        operation: Operation,
        message: String,
    },
    #[error("unexpected error while {0}")]
    Unexpected(Operation),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    pub fn detail(&self) -> FailureDetail {
        FailureDetail {
            message: self.to_string(),
            is_not_found: self.is_not_found(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Clone)]
pub struct StorageGateway {
    backend: Arc<dyn ObjectBackend>,
    /// Endpoint used to build public object URLs, without a trailing `/`.
    public_endpoint: String,
    /// Upper bound on each backend round trip.
    operation_timeout: Duration,
}

impl StorageGateway {
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        endpoint: &str,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            public_endpoint: endpoint.trim_end_matches('/').to_string(),
            operation_timeout,
        }
    }

    /// Create `bucket` unless it already exists.
    ///
    /// Idempotent: a create that loses a race to another caller comes back
    /// as "already owned by you", which counts as success.
    pub async fn ensure_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        let op = Operation::EnsureBucket;
        let names = self
            .bounded(self.backend.list_bucket_names())
            .await
            .map_err(|err| classify(op, bucket.as_str(), err))?;

        if names.iter().any(|name| name == bucket.as_str()) {
            return Ok(());
        }

        match self.bounded(self.backend.create_bucket(bucket)).await {
            Ok(()) => {
                info!(%bucket, "bucket created");
                Ok(())
            }
            Err(BackendError::BucketAlreadyOwned(_)) => {
                debug!(%bucket, "bucket created concurrently");
                Ok(())
            }
            Err(err) => Err(classify(op, bucket.as_str(), err)),
        }
    }

    /// Store `body` under `key`, replacing any existing object.
    ///
    /// Input is assumed validated: empty uploads are rejected before this point.
    pub async fn upload_object(
        &self,
        body: UploadBody,
        key: &ObjectKey,
        bucket: &BucketName,
    ) -> StorageResult<UploadOutcome> {
        let etag = self
            .bounded(self.backend.put_object(bucket, key, body))
            .await
            .map_err(|err| classify(Operation::Upload, key.as_str(), err))?;

        let public_url = self.public_url(bucket, key);
        info!(%bucket, %key, url = %public_url, "file uploaded");

        Ok(UploadOutcome {
            public_url,
            object_key: key.clone(),
            etag,
        })
    }

    /// List every key in `bucket`, following continuation tokens until the
    /// store reports no more pages.
    pub async fn list_objects(&self, bucket: &BucketName) -> StorageResult<ListingOutcome> {
        let mut object_keys = Vec::new();
        let mut continuation_token = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .bounded(self.backend.list_objects_page(bucket, continuation_token.take()))
                .await
                .map_err(|err| classify(Operation::List, bucket.as_str(), err))?;
            pages += 1;
            debug!(%bucket, page = pages, keys = page.keys.len(), "listed page");

            object_keys.extend(page.keys);
            match page.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        info!(%bucket, count = object_keys.len(), pages, "listed files");
        Ok(ListingOutcome { object_keys })
    }

    /// Open `key` for streaming.
    ///
    /// The content type comes from the key's extension alone.
    pub async fn download_object(
        &self,
        key: &ObjectKey,
        bucket: &BucketName,
    ) -> StorageResult<DownloadOutcome> {
        let fetched = self
            .bounded(self.backend.get_object(bucket, key))
            .await
            .map_err(|err| classify(Operation::Download, key.as_str(), err))?;

        info!(%bucket, %key, "file download started");

        Ok(DownloadOutcome {
            content: fetched.content,
            content_type: content_type_for(key),
            content_length: fetched.content_length,
            object_key: key.clone(),
        })
    }

    /// Cheapest authenticated round trip; backs the readiness endpoint.
    pub async fn ping(&self) -> StorageResult<usize> {
        self.bounded(self.backend.list_bucket_names())
            .await
            .map(|names| names.len())
            .map_err(|err| classify(Operation::Ping, "*", err))
    }

    fn public_url(&self, bucket: &BucketName, key: &ObjectKey) -> String {
        format!("{}/{}/{}", self.public_endpoint, bucket, key)
    }

    /// Drop the in-flight request once the operation timeout elapses.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .unwrap_or(Err(BackendError::TimedOut(self.operation_timeout)))
    }
}

/// Log a backend failure with its source and map it onto the public taxonomy.
fn classify(op: Operation, target: &str, err: BackendError) -> StorageError {
    match err {
        BackendError::ObjectNotFound { key, .. } => {
            debug!(%key, "{op}: not found");
            StorageError::NotFound { key }
        }
        BackendError::Io(source) => {
            error!(target_name = target, error = %source, "unexpected error while {op}");
            StorageError::Unexpected(op)
        }
        other => {
            error!(target_name = target, error = %other, "storage error while {op}");
            StorageError::Protocol {
                operation: op,
                message: other.to_string(),
            }
        }
    }
}
