//! S3-compatible object client (requires the `s3` feature).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use assethub_core::config::BackendConfig;
use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;

use super::object::ObjectClient;

/// [`ObjectClient`] backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectClient {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectClient {
    /// Connect using the default AWS credential chain.
    pub async fn connect(config: &BackendConfig) -> AppResult<Self> {
        let bucket = config.bucket.clone().ok_or_else(|| {
            AppError::configuration(format!("Backend '{}' has no bucket", config.name))
        })?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(bucket = %bucket, endpoint = ?config.endpoint, "Initializing S3 client");
        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket,
        })
    }
}

fn s3_error<E>(message: String) -> impl FnOnce(E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| AppError::with_source(ErrorKind::Storage, message, e)
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(s3_error(format!("Failed to put object: {key}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_no_such_key() => {
                    AppError::not_found(format!("Object not found: {key}"))
                }
                err => AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to get object: {key}"),
                    err,
                ),
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(s3_error(format!("Failed to read object body: {key}")))?;
        Ok(body.into_bytes())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(s3_error(format!("Failed to delete object: {key}")))?;
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let source = format!("{}/{}", self.bucket, urlencoding::encode(from));
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(source)
            .key(to)
            .send()
            .await
            .map_err(s3_error(format!("Failed to copy object: {from} -> {to}")))?;
        Ok(())
    }

    async fn head(&self, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match e.into_service_error() {
                err if err.is_not_found() => Ok(false),
                err => Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to stat object: {key}"),
                    err,
                )),
            },
        }
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(s3_error(format!("Failed to list objects: {prefix}")))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match page.next_continuation_token() {
                Some(next) if page.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string())
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}
