// Adapters layer: concrete storage backends behind `StorageClient`.

pub mod local;
#[cfg(feature = "lambda")]
pub mod s3;

pub use local::LocalStorage;
#[cfg(feature = "lambda")]
pub use s3::{build_s3_client, S3Storage};
