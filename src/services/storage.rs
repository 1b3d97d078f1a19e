//! Document storage behind the narrow save/get/delete contract.
//!
//! The production backend is S3 (AWS or MinIO for development); the pipeline
//! only ever sees the [`DocumentStore`] trait so tests can substitute an
//! in-memory double.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use tracing::info;

use crate::config::StorageSettings;
use crate::error::{AppError, AppResult};
use crate::models::StoredDocument;

/// Narrow storage contract consumed by the ingestion coordinator.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Save a document, returning its storage path and size.
    async fn save(
        &self,
        data: Vec<u8>,
        file_name: &str,
        subfolder: Option<&str>,
    ) -> AppResult<StoredDocument>;

    /// Fetch a previously saved document.
    async fn get(&self, path: &str) -> AppResult<Vec<u8>>;

    /// Delete a saved document.
    async fn delete(&self, path: &str) -> AppResult<()>;
}

/// Reject keys that would escape the configured storage root.
///
/// Applied to every path before it reaches the backend, both the ones we
/// build and the ones callers pass back in.
pub fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::Storage("Empty storage path".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(AppError::Storage(format!("Invalid storage path: {}", key)));
    }
    Ok(())
}

/// S3 document store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 store from configuration.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "mip");

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        // Use custom endpoint for MinIO in development
        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        let store = Self {
            client,
            bucket: config.bucket.clone(),
        };

        store.ensure_bucket_exists().await?;

        info!("S3 document store initialized: bucket={}", config.bucket);

        Ok(store)
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }

    /// Build the storage key for a document.
    ///
    /// Format: `documents/{subfolder}/{file_name}` or `documents/{file_name}`.
    pub fn document_key(file_name: &str, subfolder: Option<&str>) -> String {
        match subfolder {
            Some(folder) => format!("documents/{}/{}", folder, file_name),
            None => format!("documents/{}", file_name),
        }
    }
}

#[async_trait]
impl DocumentStore for S3Store {
    async fn save(
        &self,
        data: Vec<u8>,
        file_name: &str,
        subfolder: Option<&str>,
    ) -> AppResult<StoredDocument> {
        let key = Self::document_key(file_name, subfolder);
        validate_key(&key)?;

        let size = data.len() as i64;
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload document: {}", e)))?;

        Ok(StoredDocument { path: key, size })
    }

    async fn get(&self, path: &str) -> AppResult<Vec<u8>> {
        validate_key(path)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(format!("Document {}", path))
                } else {
                    AppError::Storage(format!("Failed to get document: {}", service_error))
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read document body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        validate_key(path)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete document: {}", e)))?;

        Ok(())
    }
}
