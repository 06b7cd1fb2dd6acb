use crate::config::S3Settings;
use crate::core::{ObjectStream, StorageClient};
use crate::utils::error::StorageError;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;

/// Builds the S3 client on top of the ambient AWS configuration, applying
/// whatever overrides `settings` carries.
pub async fn build_s3_client(settings: &S3Settings) -> S3Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "csv2json-etl-static",
        ));
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);

    // 自訂端點 (LocalStack / MinIO) 需要 path-style
    if let Some(endpoint) = &settings.endpoint_url {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    S3Client::from_conf(builder.build())
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

fn classify<E>(bucket: &str, key: &str, err: E) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let code = err.code().map(str::to_string);
    match code.as_deref() {
        Some("NoSuchKey") | Some("NoSuchBucket") | Some("NotFound") => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some("AccessDenied") | Some("Forbidden") => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StorageError::Transient(DisplayErrorContext(err).to_string()),
    }
}

impl StorageClient for S3Storage {
    async fn get_object_stream(&self, bucket: &str, key: &str) -> Result<ObjectStream, StorageError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(bucket, key, e.into_service_error()))?;

        tracing::debug!(
            "Streaming s3://{}/{} ({} bytes)",
            bucket,
            key,
            resp.content_length().unwrap_or_default()
        );
        Ok(Box::new(resp.body.into_async_read()))
    }

    async fn put_object(&self, bucket: &str, key: &str, file_path: &Path) -> Result<(), StorageError> {
        let body = ByteStream::from_path(file_path)
            .await
            .map_err(|e| StorageError::Transient(format!("Failed to open {}: {}", file_path.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| classify(bucket, key, e.into_service_error()))?;

        Ok(())
    }
}
