//! Object-storage notification payload, reduced to the fields the handler reads.

use crate::domain::model::ObjectRef;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<S3EventRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl S3Event {
    /// Objects in delivery order. A missing or null `Records` list is an empty batch.
    ///
    /// Notification keys arrive URL-encoded (`my+file.csv`, `%C3%A9.csv`) and are
    /// passed through verbatim, not decoded. A key containing spaces or
    /// non-ASCII characters therefore will not match the stored object and
    /// fails as a read error for that object only.
    pub fn object_refs(&self) -> Vec<ObjectRef> {
        self.records
            .iter()
            .flatten()
            .map(|r| ObjectRef::new(r.s3.bucket.name.clone(), r.s3.object.key.clone()))
            .collect()
    }
}
