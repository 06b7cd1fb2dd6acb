pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
#[cfg(feature = "lambda")]
pub use adapters::{build_s3_client, S3Storage};
pub use config::{ConvertConfig, S3Settings};
pub use core::etl::BatchCoordinator;
pub use domain::event::S3Event;
pub use domain::model::{BatchSummary, ObjectRef, OutputFormat};
pub use utils::error::{EtlError, Result, StorageError};
