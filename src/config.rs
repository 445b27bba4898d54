use crate::models::names::BucketName;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub s3: S3Settings,
    pub bucket: BucketName,
    pub operation_timeout: Duration,
    pub max_upload_bytes: usize,
}

/// Connection details for the object store.
#[derive(Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "HTTP file gateway over an S3-compatible store")]
pub struct Args {
    /// Host to bind to (overrides FILE_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// S3 endpoint URL (overrides FILE_GATEWAY_S3_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// S3 access key (overrides FILE_GATEWAY_S3_ACCESS_KEY)
    #[arg(long)]
    pub access_key: Option<String>,

    /// S3 secret key (overrides FILE_GATEWAY_S3_SECRET_KEY)
    #[arg(long)]
    pub secret_key: Option<String>,

    /// S3 region (overrides FILE_GATEWAY_S3_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Bucket holding uploaded files (overrides FILE_GATEWAY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Per-request timeout against the store, in seconds
    /// (overrides FILE_GATEWAY_OPERATION_TIMEOUT_SECS)
    #[arg(long)]
    pub operation_timeout_secs: Option<u64>,

    /// Largest accepted upload body, in bytes (overrides FILE_GATEWAY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge `args` over values looked up through `env`, then validate.
    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = args
            .host
            .or_else(|| env("FILE_GATEWAY_HOST"))
            .unwrap_or_else(|| "0.0.0.0".into());
        let port = match args.port {
            Some(port) => port,
            None => parse_env(&env, "FILE_GATEWAY_PORT")?.unwrap_or(3000),
        };
        let endpoint = args
            .endpoint
            .or_else(|| env("FILE_GATEWAY_S3_ENDPOINT"))
            .unwrap_or_else(|| "http://localhost:9000".into());
        let access_key = args
            .access_key
            .or_else(|| env("FILE_GATEWAY_S3_ACCESS_KEY"))
            .unwrap_or_default();
        let secret_key = args
            .secret_key
            .or_else(|| env("FILE_GATEWAY_S3_SECRET_KEY"))
            .unwrap_or_default();
        let region = args
            .region
            .or_else(|| env("FILE_GATEWAY_S3_REGION"))
            .unwrap_or_else(|| "us-east-1".into());
        let bucket = args
            .bucket
            .or_else(|| env("FILE_GATEWAY_BUCKET"))
            .unwrap_or_else(|| "chatbot-files".into());
        let timeout_secs = match args.operation_timeout_secs {
            Some(secs) => secs,
            None => parse_env(&env, "FILE_GATEWAY_OPERATION_TIMEOUT_SECS")?.unwrap_or(30),
        };
        let max_upload_bytes = match args.max_upload_bytes {
            Some(bytes) => bytes,
            None => parse_env(&env, "FILE_GATEWAY_MAX_UPLOAD_BYTES")?.unwrap_or(64 * 1024 * 1024),
        };

        if endpoint.trim().is_empty() {
            bail!("S3 endpoint must not be empty");
        }
        if access_key.is_empty() || secret_key.is_empty() {
            bail!(
                "S3 credentials are required: set FILE_GATEWAY_S3_ACCESS_KEY and \
                 FILE_GATEWAY_S3_SECRET_KEY (or pass --access-key/--secret-key)"
            );
        }
        if timeout_secs == 0 {
            bail!("operation timeout must be at least one second");
        }
        let bucket = BucketName::parse(bucket).context("validating configured bucket name")?;

        Ok(Self {
            host,
            port,
            s3: S3Settings {
                endpoint,
                access_key,
                secret_key,
                region,
            },
            bucket,
            operation_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(name)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", name, value))
        })
        .transpose()
}
