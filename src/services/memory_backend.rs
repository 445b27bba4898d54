//! In-memory [`ObjectBackend`] used as a test double.
//!
//! Behaves like a single-account S3 store and adds knobs the real store
//! cannot offer on demand: small listing pages, injected faults, a stalled
//! read path, a bucket listing that lags behind creation, and a counter of
//! download streams that are still alive.

use crate::{
    models::{
        names::{BucketName, ObjectKey},
        object::ObjectStream,
    },
    services::backend::{BackendError, FetchedObject, ObjectBackend, ObjectPage, UploadBody},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::{
    collections::BTreeMap,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

const CHUNK_SIZE: usize = 4;

type Buckets = BTreeMap<String, BTreeMap<String, Bytes>>;

pub struct MemoryBackend {
    buckets: Mutex<Buckets>,
    page_size: usize,
    open_streams: Arc<AtomicUsize>,
    create_calls: AtomicUsize,
    list_calls: AtomicUsize,
    fault: Mutex<Option<String>>,
    stall_reads: AtomicBool,
    stale_bucket_listing: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_page_size(1000)
    }
}

impl MemoryBackend {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: Mutex::default(),
            page_size: page_size.max(1),
            open_streams: Arc::default(),
            create_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            fault: Mutex::default(),
            stall_reads: AtomicBool::new(false),
            stale_bucket_listing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with a protocol error carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fault.lock().unwrap() = Some(message.into());
    }

    /// Never answer `get_object`.
    pub fn stall_reads(&self) {
        self.stall_reads.store(true, Ordering::SeqCst);
    }

    /// Omit every bucket from `list_bucket_names`, as if another actor had
    /// created it after our listing was taken.
    pub fn hide_buckets_from_listing(&self) {
        self.stale_bucket_listing.store(true, Ordering::SeqCst);
    }

    pub fn insert_bucket(&self, bucket: &str) {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default();
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().unwrap().len()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Download streams handed out and not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    fn check_fault(&self) -> Result<(), BackendError> {
        match self.fault.lock().unwrap().as_ref() {
            Some(message) => Err(BackendError::Protocol(message.clone())),
            None => Ok(()),
        }
    }

    fn no_such_bucket(bucket: &BucketName) -> BackendError {
        BackendError::Protocol(format!(
            "NoSuchBucket: The specified bucket `{bucket}` does not exist"
        ))
    }
}

/// Tracks one live download stream; released on drop.
struct StreamGuard(Arc<AtomicUsize>);

impl StreamGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn list_bucket_names(&self) -> Result<Vec<String>, BackendError> {
        self.check_fault()?;
        if self.stale_bucket_listing.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.buckets.lock().unwrap().keys().cloned().collect())
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), BackendError> {
        self.check_fault()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut buckets = self.buckets.lock().unwrap();
        if buckets.contains_key(bucket.as_str()) {
            return Err(BackendError::BucketAlreadyOwned(bucket.to_string()));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: UploadBody,
    ) -> Result<Option<String>, BackendError> {
        self.check_fault()?;
        let data = body
            .content
            .collect()
            .await
            .map_err(io::Error::other)?
            .into_bytes();
        let etag = format!("\"{:x}\"", md5::compute(&data));

        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        objects.insert(key.to_string(), data);
        Ok(Some(etag))
    }

    async fn list_objects_page(
        &self,
        bucket: &BucketName,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError> {
        self.check_fault()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        let mut remaining = objects
            .keys()
            .filter(|key| continuation_token.as_ref().is_none_or(|token| *key > token));
        let keys: Vec<String> = remaining.by_ref().take(self.page_size).cloned().collect();
        let next_continuation_token = match remaining.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };

        Ok(ObjectPage {
            keys,
            next_continuation_token,
        })
    }

    async fn get_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> Result<FetchedObject, BackendError> {
        self.check_fault()?;
        if self.stall_reads.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }

        let data = self
            .buckets
            .lock()
            .unwrap()
            .get(bucket.as_str())
            .and_then(|objects| objects.get(key.as_str()))
            .cloned()
            .ok_or_else(|| BackendError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        let content_length = Some(data.len() as u64);
        let chunks: Vec<io::Result<Bytes>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
            .collect();
        let guard = StreamGuard::acquire(&self.open_streams);
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            let _held = &guard;
            chunk
        });

        Ok(FetchedObject {
            content: ObjectStream::new(stream),
            content_length,
        })
    }
}
