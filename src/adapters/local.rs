use crate::core::{ObjectStream, StorageClient};
use crate::utils::error::StorageError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory-backed storage: objects live at `<root>/<bucket>/<key>`.
/// Used for local replays of notifications and in tests.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.base_path.join(bucket).join(key)
    }

    fn map_error(bucket: &str, key: &str, err: std::io::Error) -> StorageError {
        match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            ErrorKind::PermissionDenied => StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StorageError::Io(err),
        }
    }
}

impl StorageClient for LocalStorage {
    async fn get_object_stream(&self, bucket: &str, key: &str) -> Result<ObjectStream, StorageError> {
        let file = fs::File::open(self.object_path(bucket, key))
            .await
            .map_err(|e| Self::map_error(bucket, key, e))?;
        Ok(Box::new(file))
    }

    async fn put_object(&self, bucket: &str, key: &str, file_path: &Path) -> Result<(), StorageError> {
        let full_path = self.object_path(bucket, key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::map_error(bucket, key, e))?;
        }

        fs::copy(file_path, &full_path)
            .await
            .map_err(|e| Self::map_error(bucket, key, e))?;
        Ok(())
    }
}
