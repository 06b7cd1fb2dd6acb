use crate::domain::model::OutputFormat;
use crate::utils::error::StorageError;
use std::path::Path;
use tokio::io::AsyncRead;

/// Byte stream of an object being read from storage.
pub type ObjectStream = Box<dyn AsyncRead + Send + Unpin>;

/// Object storage capability handed to the batch coordinator.
pub trait StorageClient: Send + Sync {
    fn get_object_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<ObjectStream, StorageError>> + Send;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn scratch_dir(&self) -> &Path;
    fn output_format(&self) -> OutputFormat;
    fn input_segment(&self) -> &str;
    fn output_segment(&self) -> &str;
}
