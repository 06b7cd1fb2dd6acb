pub mod etl;
pub mod row;
pub mod transcoder;

pub use crate::domain::model::{Header, OutputFormat, Record, TransformOutcome};
pub use crate::domain::ports::{ConfigProvider, ObjectStream, StorageClient};
pub use crate::utils::error::Result;
