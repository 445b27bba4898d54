//! [`ObjectBackend`] over any S3-compatible endpoint (RustFS, MinIO, AWS).
//!
//! Requests are addressed path-style against the configured endpoint and
//! signed with a static credential pair.

use crate::{
    config::S3Settings,
    models::{
        names::{BucketName, ObjectKey},
        object::ObjectStream,
    },
    services::backend::{BackendError, FetchedObject, ObjectBackend, ObjectPage, UploadBody},
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client, Config as S3Config,
    config::{BehaviorVersion, Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Region in which S3 rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    region: String,
}

impl S3Backend {
    pub fn new(settings: &S3Settings) -> Self {
        debug!(
            endpoint = %settings.endpoint,
            region = %settings.region,
            "configuring S3 client"
        );

        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "file-gateway",
        );

        let config = S3Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint.clone())
            .force_path_style(true)
            .behavior_version(BehaviorVersion::latest())
            .build();

        info!(endpoint = %settings.endpoint, "S3 client initialized");

        Self {
            client: Client::from_conf(config),
            region: settings.region.clone(),
        }
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn list_bucket_names(&self) -> Result<Vec<String>, BackendError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| protocol(&err))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_owned))
            .collect())
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), BackendError> {
        let mut request = self.client.create_bucket().bucket(bucket.as_str());
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) if StoreFault::of(&err).is_already_owned() => {
                Err(BackendError::BucketAlreadyOwned(bucket.to_string()))
            }
            Err(err) => Err(protocol(&err)),
        }
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: UploadBody,
    ) -> Result<Option<String>, BackendError> {
        let output = self
            .client
            .put_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .body(body.content)
            .set_content_md5(body.content_md5)
            .set_content_type(body.content_type)
            .send()
            .await
            .map_err(|err| protocol(&err))?;

        Ok(output.e_tag().map(str::to_owned))
    }

    async fn list_objects_page(
        &self,
        bucket: &BucketName,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket.as_str())
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|err| protocol(&err))?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect();
        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_owned)
        } else {
            None
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
        match self
            .client
            .get_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
        {
            Ok(output) => {
                let content_length = output
                    .content_length()
                    .and_then(|len| u64::try_from(len).ok());
                let reader = output.body.into_async_read();
                Ok(FetchedObject {
                    content: ObjectStream::new(ReaderStream::new(reader)),
                    content_length,
                })
            }
            Err(err) if StoreFault::of(&err).is_missing_object() => {
                Err(BackendError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(err) => Err(protocol(&err)),
        }
    }
}

/// Error metadata the store attached to a failed request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StoreFault<'a> {
    code: Option<&'a str>,
    message: Option<&'a str>,
    status: Option<u16>,
}

impl<'a> StoreFault<'a> {
    fn of<E: ProvideErrorMetadata>(err: &'a SdkError<E>) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
            status: err
                .raw_response()
                .map(|response| response.status().as_u16()),
        }
    }

    /// NoSuchKey, or any bare 404 from stores that omit the error code.
    fn is_missing_object(&self) -> bool {
        self.code == Some("NoSuchKey") || self.status == Some(404)
    }

    /// `BucketAlreadyExists` is someone else's bucket and stays a failure.
    fn is_already_owned(&self) -> bool {
        self.code == Some("BucketAlreadyOwnedByYou")
    }

    /// The store's own code and message, or `None` when it sent no code.
    fn describe(&self) -> Option<String> {
        match (self.code, self.message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (Some(code), None) => Some(code.to_string()),
            (None, _) => None,
        }
    }
}

/// Transport-level faults carry no code; report their full error chain.
fn protocol<E>(err: &SdkError<E>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = StoreFault::of(err)
        .describe()
        .unwrap_or_else(|| DisplayErrorContext(err).to_string());
    BackendError::Protocol(message)
}
