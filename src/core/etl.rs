use crate::core::row::DEFAULT_DELIMITER;
use crate::core::transcoder::transcode;
use crate::core::{ConfigProvider, StorageClient};
use crate::domain::model::{
    BatchSummary, ObjectRef, ObjectReport, ObjectStatus, TranscodeStats, TransformOutcome,
};
use crate::utils::error::{EtlError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{BufReader, BufWriter};
use uuid::Uuid;

pub const SOURCE_SUFFIX: &str = ".csv";
pub const TARGET_SUFFIX: &str = ".json";

/// Maps a source key to its output key: the trailing `.csv` becomes `.json`
/// and the first occurrence of `input_segment` becomes `output_segment`.
pub fn destination_key(source_key: &str, input_segment: &str, output_segment: &str) -> String {
    let stem = source_key.strip_suffix(SOURCE_SUFFIX).unwrap_or(source_key);
    let key = format!("{}{}", stem, TARGET_SUFFIX);

    if input_segment.is_empty() {
        return key;
    }
    key.replacen(input_segment, output_segment, 1)
}

/// Drives one notification batch through the transcoder, uploading each
/// result and removing its scratch file. Objects are handled one at a time
/// and a failing object never stops the rest of the batch.
pub struct BatchCoordinator<S: StorageClient, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: StorageClient, C: ConfigProvider> BatchCoordinator<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    #[tracing::instrument(skip_all, fields(objects = objects.len()))]
    pub async fn run(&self, objects: &[ObjectRef]) -> BatchSummary {
        tracing::info!("Start processing CSV files");
        let mut summary = BatchSummary::default();

        for object in objects {
            if !object.key.ends_with(SOURCE_SUFFIX) {
                tracing::debug!(bucket = %object.bucket, key = %object.key, "Skipping non-CSV object");
                summary.skipped += 1;
                continue;
            }

            let report = self.process_object(object).await;
            summary.objects.push(report);
        }

        tracing::info!(
            uploaded = summary.uploaded(),
            failed = summary.failed(),
            skipped = summary.skipped,
            "End processing CSV files"
        );
        summary
    }

    #[tracing::instrument(skip_all, fields(bucket = %object.bucket, key = %object.key))]
    async fn process_object(&self, object: &ObjectRef) -> ObjectReport {
        let outcome = self.transform(object).await;

        let report = match &outcome.result {
            Err(e) => {
                tracing::error!("CSV {} with error {}", outcome.source_key, e);
                ObjectReport {
                    source_key: outcome.source_key.clone(),
                    destination_key: None,
                    records: 0,
                    status: ObjectStatus::TransformFailed,
                    error: Some(e.to_string()),
                }
            }
            Ok(stats) => self.upload(&outcome, *stats).await,
        };

        self.cleanup(&outcome.scratch_path).await;
        report
    }

    /// Transcodes one object into a freshly named scratch file.
    pub async fn transform(&self, object: &ObjectRef) -> TransformOutcome {
        let scratch_path = self.scratch_path();
        let result = self.transcode_into(object, &scratch_path).await;

        TransformOutcome {
            bucket: object.bucket.clone(),
            source_key: object.key.clone(),
            scratch_path,
            result,
        }
    }

    async fn transcode_into(&self, object: &ObjectRef, scratch_path: &Path) -> Result<TranscodeStats> {
        let stream = self
            .storage
            .get_object_stream(&object.bucket, &object.key)
            .await?;
        let file = File::create(scratch_path).await?;

        transcode(
            BufReader::new(stream),
            BufWriter::new(file),
            self.config.output_format(),
            DEFAULT_DELIMITER,
        )
        .await
    }

    async fn upload(&self, outcome: &TransformOutcome, stats: TranscodeStats) -> ObjectReport {
        tracing::info!(
            "Json generated: {} ({} records)",
            outcome.scratch_path.display(),
            stats.records
        );

        let json_key = destination_key(
            &outcome.source_key,
            self.config.input_segment(),
            self.config.output_segment(),
        );

        let result = self
            .storage
            .put_object(&outcome.bucket, &json_key, &outcome.scratch_path)
            .await
            .map_err(EtlError::UploadError);

        let (status, error) = match result {
            Ok(()) => {
                tracing::info!("Json uploaded: {}", json_key);
                (ObjectStatus::Uploaded, None)
            }
            Err(e) => {
                tracing::error!("Uploading file {} with error: {}", json_key, e);
                (ObjectStatus::UploadFailed, Some(e.to_string()))
            }
        };

        ObjectReport {
            source_key: outcome.source_key.clone(),
            destination_key: Some(json_key),
            records: stats.records,
            status,
            error,
        }
    }

    async fn cleanup(&self, scratch_path: &Path) {
        match tokio::fs::remove_file(scratch_path).await {
            Ok(()) => tracing::debug!("Temp file deleted: {}", scratch_path.display()),
            // 下載失敗時暫存檔可能從未建立
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to delete temp file {}: {}",
                scratch_path.display(),
                EtlError::LocalIoError(e)
            ),
        }
    }

    fn scratch_path(&self) -> PathBuf {
        self.config
            .scratch_dir()
            .join(format!("{}{}", Uuid::new_v4(), TARGET_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectStream;
    use crate::domain::model::OutputFormat;
    use crate::utils::error::StorageError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
        failing_puts: Arc<Mutex<HashSet<String>>>,
        get_calls: Arc<Mutex<Vec<String>>>,
        put_calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockStorage {
        async fn insert(&self, bucket: &str, key: &str, data: &str) {
            self.insert_bytes(bucket, key, data.as_bytes()).await;
        }

        async fn insert_bytes(&self, bucket: &str, key: &str, data: &[u8]) {
            self.objects
                .lock()
                .await
                .insert((bucket.to_string(), key.to_string()), data.to_vec());
        }

        async fn fail_put(&self, key: &str) {
            self.failing_puts.lock().await.insert(key.to_string());
        }

        async fn get_file(&self, bucket: &str, key: &str) -> Option<String> {
            self.objects
                .lock()
                .await
                .get(&(bucket.to_string(), key.to_string()))
                .map(|data| String::from_utf8(data.clone()).unwrap())
        }
    }

    impl StorageClient for MockStorage {
        async fn get_object_stream(
            &self,
            bucket: &str,
            key: &str,
        ) -> std::result::Result<ObjectStream, StorageError> {
            self.get_calls.lock().await.push(key.to_string());
            let objects = self.objects.lock().await;
            let data = objects
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?;
            Ok(Box::new(std::io::Cursor::new(data)))
        }

        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            file_path: &Path,
        ) -> std::result::Result<(), StorageError> {
            self.put_calls.lock().await.push(key.to_string());
            if self.failing_puts.lock().await.contains(key) {
                return Err(StorageError::Transient("connection reset".to_string()));
            }
            let data = tokio::fs::read(file_path).await?;
            self.objects
                .lock()
                .await
                .insert((bucket.to_string(), key.to_string()), data);
            Ok(())
        }
    }

    struct MockConfig {
        scratch_dir: PathBuf,
        output_format: OutputFormat,
    }

    impl MockConfig {
        fn new(scratch_dir: &Path) -> Self {
            Self {
                scratch_dir: scratch_dir.to_path_buf(),
                output_format: OutputFormat::Ndjson,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn scratch_dir(&self) -> &Path {
            &self.scratch_dir
        }

        fn output_format(&self) -> OutputFormat {
            self.output_format
        }

        fn input_segment(&self) -> &str {
            "inputs"
        }

        fn output_segment(&self) -> &str {
            "outputs"
        }
    }

    fn scratch_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_destination_key_rewrites_segment_and_suffix() {
        assert_eq!(destination_key("inputs/data.csv", "inputs", "outputs"), "outputs/data.json");
        assert_eq!(destination_key("archive/data.csv", "inputs", "outputs"), "archive/data.json");
    }

    #[test]
    fn test_destination_key_replaces_only_trailing_suffix_and_first_segment() {
        assert_eq!(
            destination_key("inputs/my.csv.files/inputs.csv", "inputs", "outputs"),
            "outputs/my.csv.files/inputs.json"
        );
        assert_eq!(destination_key("data.csv", "", "outputs"), "data.json");
    }

    #[tokio::test]
    async fn test_single_object_is_uploaded_as_ndjson() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/data.csv", "a,b,c\n1,2,3\n4,5,6\n").await;

        let coordinator = BatchCoordinator::new(storage.clone(), MockConfig::new(scratch.path()));
        let summary = coordinator
            .run(&[ObjectRef::new("bucket", "inputs/data.csv")])
            .await;

        assert_eq!(summary.uploaded(), 1);
        assert_eq!(summary.records_processed(), 2);
        assert_eq!(
            summary.objects[0].destination_key.as_deref(),
            Some("outputs/data.json")
        );
        assert_eq!(
            storage.get_file("bucket", "outputs/data.json").await.unwrap(),
            "{\"a\":\"1\",\"b\":\"2\",\"c\":\"3\"}\n{\"a\":\"4\",\"b\":\"5\",\"c\":\"6\"}\n"
        );
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_json_array_framing() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/data.csv", "a\n1\n2\n").await;

        let mut config = MockConfig::new(scratch.path());
        config.output_format = OutputFormat::JsonArray;
        let coordinator = BatchCoordinator::new(storage.clone(), config);
        coordinator
            .run(&[ObjectRef::new("bucket", "inputs/data.csv")])
            .await;

        assert_eq!(
            storage.get_file("bucket", "outputs/data.json").await.unwrap(),
            r#"[{"a":"1"},{"a":"2"}]"#
        );
    }

    #[tokio::test]
    async fn test_unreadable_object_does_not_stop_batch() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/one.csv", "k\n1\n").await;
        storage.insert("bucket", "inputs/three.csv", "k\n3\n").await;

        let coordinator = BatchCoordinator::new(storage.clone(), MockConfig::new(scratch.path()));
        let summary = coordinator
            .run(&[
                ObjectRef::new("bucket", "inputs/one.csv"),
                ObjectRef::new("bucket", "inputs/two.csv"),
                ObjectRef::new("bucket", "inputs/three.csv"),
            ])
            .await;

        assert_eq!(summary.objects.len(), 3);
        assert_eq!(summary.uploaded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.objects[1].status, ObjectStatus::TransformFailed);
        assert!(summary.objects[1].error.as_ref().unwrap().contains("not found"));
        assert!(summary.objects[1].destination_key.is_none());

        assert!(storage.get_file("bucket", "outputs/one.json").await.is_some());
        assert!(storage.get_file("bucket", "outputs/three.json").await.is_some());
        assert_eq!(
            *storage.put_calls.lock().await,
            vec!["outputs/one.json".to_string(), "outputs/three.json".to_string()]
        );
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_is_isolated() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/a.csv", "k\n1\n").await;
        storage.insert("bucket", "inputs/b.csv", "k\n2\n").await;
        storage.fail_put("outputs/a.json").await;

        let coordinator = BatchCoordinator::new(storage.clone(), MockConfig::new(scratch.path()));
        let summary = coordinator
            .run(&[
                ObjectRef::new("bucket", "inputs/a.csv"),
                ObjectRef::new("bucket", "inputs/b.csv"),
            ])
            .await;

        assert_eq!(summary.objects[0].status, ObjectStatus::UploadFailed);
        assert_eq!(summary.objects[1].status, ObjectStatus::Uploaded);
        assert_eq!(summary.records_processed(), 1);
        assert!(storage.get_file("bucket", "outputs/b.json").await.is_some());
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_non_csv_keys_are_skipped_without_reading() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/data.CSV", "k\n1\n").await;
        storage.insert("bucket", "inputs/data.json", "{}").await;

        let coordinator = BatchCoordinator::new(storage.clone(), MockConfig::new(scratch.path()));
        let summary = coordinator
            .run(&[
                ObjectRef::new("bucket", "inputs/data.CSV"),
                ObjectRef::new("bucket", "inputs/data.json"),
            ])
            .await;

        assert!(summary.objects.is_empty());
        assert_eq!(summary.skipped, 2);
        assert!(storage.get_calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let scratch = TempDir::new().unwrap();
        let coordinator =
            BatchCoordinator::new(MockStorage::default(), MockConfig::new(scratch.path()));

        let summary = coordinator.run(&[]).await;

        assert!(summary.objects.is_empty());
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_transform_outcome_uses_unique_scratch_paths() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/data.csv", "k\n1\n").await;
        let coordinator = BatchCoordinator::new(storage, MockConfig::new(scratch.path()));
        let object = ObjectRef::new("bucket", "inputs/data.csv");

        let first = coordinator.transform(&object).await;
        let second = coordinator.transform(&object).await;

        assert_ne!(first.scratch_path, second.scratch_path);
        assert!(first.scratch_path.starts_with(scratch.path()));
        assert_eq!(first.result.as_ref().unwrap().records, 1);
        assert_eq!(
            std::fs::read(&first.scratch_path).unwrap(),
            std::fs::read(&second.scratch_path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_decode_failure_after_header_removes_partial_scratch_file() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage
            .insert_bytes("bucket", "inputs/broken.csv", b"a,b\n1,2\n\xff\xfe,3\n")
            .await;
        storage.insert("bucket", "inputs/ok.csv", "a\n1\n").await;

        let coordinator = BatchCoordinator::new(storage.clone(), MockConfig::new(scratch.path()));
        let summary = coordinator
            .run(&[
                ObjectRef::new("bucket", "inputs/broken.csv"),
                ObjectRef::new("bucket", "inputs/ok.csv"),
            ])
            .await;

        assert_eq!(summary.objects[0].status, ObjectStatus::TransformFailed);
        assert!(summary.objects[0]
            .error
            .as_ref()
            .unwrap()
            .starts_with("Source decode error"));
        assert_eq!(summary.objects[1].status, ObjectStatus::Uploaded);
        assert_eq!(
            *storage.put_calls.lock().await,
            vec!["outputs/ok.json".to_string()]
        );
        assert!(storage.get_file("bucket", "outputs/broken.json").await.is_none());
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_transform_leaves_scratch_file_until_cleanup() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage
            .insert_bytes("bucket", "inputs/broken.csv", b"a,b\n1,2\n\xff,3\n")
            .await;
        let coordinator = BatchCoordinator::new(storage, MockConfig::new(scratch.path()));

        let outcome = coordinator
            .transform(&ObjectRef::new("bucket", "inputs/broken.csv"))
            .await;

        assert!(matches!(outcome.result, Err(EtlError::SourceDecodeError(_))));
        assert!(outcome.scratch_path.exists());

        coordinator.cleanup(&outcome.scratch_path).await;
        assert!(!outcome.scratch_path.exists());
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_scratch_dir_fails_object_not_batch() {
        let scratch = TempDir::new().unwrap();
        let storage = MockStorage::default();
        storage.insert("bucket", "inputs/data.csv", "k\n1\n").await;

        let config = MockConfig::new(&scratch.path().join("missing"));
        let coordinator = BatchCoordinator::new(storage.clone(), config);
        let summary = coordinator
            .run(&[ObjectRef::new("bucket", "inputs/data.csv")])
            .await;

        assert_eq!(summary.objects[0].status, ObjectStatus::TransformFailed);
        assert!(storage.put_calls.lock().await.is_empty());
    }
}
