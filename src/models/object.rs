//! Values handed back by the storage gateway for each object operation.

use crate::models::names::ObjectKey;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream::BoxStream};
use serde::Serialize;
use std::{
    fmt, io,
    pin::Pin,
    task::{Context, Poll},
};

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// `<endpoint>/<bucket>/<key>`; not checked for reachability.
    pub public_url: String,
    pub object_key: ObjectKey,
    /// ETag reported by the store, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Snapshot of a bucket's keys at call time, in the order the store returned them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingOutcome {
    pub object_keys: Vec<String>,
}

/// An object opened for reading.
///
/// `content` is a live handle into the remote object. Dropping it, consumed
/// or not, releases the underlying connection.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub content: ObjectStream,
    pub content_type: &'static str,
    pub content_length: Option<u64>,
    pub object_key: ObjectKey,
}

/// Single-consumer stream of object bytes.
pub struct ObjectStream {
    inner: BoxStream<'static, io::Result<Bytes>>,
}

impl ObjectStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    #[cfg(test)]
    pub async fn collect_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl Stream for ObjectStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream").finish_non_exhaustive()
    }
}

/// Best-effort MIME type from the key's extension. Byte content is never inspected.
pub fn content_type_for(key: &ObjectKey) -> &'static str {
    match key.extension().as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
