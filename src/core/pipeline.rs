use crate::core::flatten::flatten_documents;
use crate::core::writer::to_csv_bytes;
use crate::core::{ConfigProvider, DocumentSource, Pipeline, Storage};
use crate::domain::model::{ExportSummary, ExportTable, ParticipantDocument};
use crate::utils::error::Result;

/// Firestore 集合 → CSV 的匯出管道
pub struct ExportPipeline<D: DocumentSource, S: Storage, C: ConfigProvider> {
    source: D,
    storage: S,
    config: C,
}

impl<D: DocumentSource, S: Storage, C: ConfigProvider> ExportPipeline<D, S, C> {
    pub fn new(source: D, storage: S, config: C) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<D: DocumentSource, S: Storage, C: ConfigProvider> Pipeline for ExportPipeline<D, S, C> {
    async fn extract(&self) -> Result<Vec<ParticipantDocument>> {
        tracing::debug!("Listing documents in collection: {}", self.config.collection());
        let documents = self.source.list_documents(self.config.collection()).await?;

        if documents.is_empty() {
            tracing::warn!(
                "⚠️ Collection '{}' returned no documents",
                self.config.collection()
            );
        }

        Ok(documents)
    }

    async fn transform(&self, data: Vec<ParticipantDocument>) -> Result<ExportTable> {
        Ok(flatten_documents(data))
    }

    async fn load(&self, table: ExportTable) -> Result<ExportSummary> {
        let output_path = self.config.output_path().to_string();
        if table.is_empty() {
            tracing::warn!("⚠️ No responses to export, writing header only");
        }

        let csv_data = to_csv_bytes(&table)?;
        tracing::debug!("Writing CSV ({} bytes) to storage", csv_data.len());
        self.storage.write_file(&output_path, &csv_data).await?;

        Ok(ExportSummary {
            output_path,
            total_responses: table.len(),
            unique_participants: table.unique_participants(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DocumentValue, Fields};
    use crate::utils::error::EtlError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        async fn write_file(&self, path: &str, _data: &[u8]) -> Result<()> {
            Err(EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("cannot write {}", path),
            )))
        }
    }

    struct MockSource {
        documents: Vec<ParticipantDocument>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl MockSource {
        fn new(documents: Vec<ParticipantDocument>) -> Self {
            Self {
                documents,
                requested: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl DocumentSource for MockSource {
        async fn list_documents(&self, collection: &str) -> Result<Vec<ParticipantDocument>> {
            self.requested.lock().await.push(collection.to_string());
            Ok(self.documents.clone())
        }
    }

    struct MockConfig {
        collection: String,
        output_path: String,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                collection: "participants".to_string(),
                output_path: "study_results.csv".to_string(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn collection(&self) -> &str {
            &self.collection
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }
    }

    fn participant(id: &str, statements: &[&str]) -> ParticipantDocument {
        let responses = statements
            .iter()
            .map(|s| {
                let mut response = Fields::new();
                response.insert("original_statement".to_string(), DocumentValue::string(*s));
                DocumentValue::Map(response)
            })
            .collect();

        let mut fields = Fields::new();
        fields.insert("prolificId".to_string(), DocumentValue::string(id));
        fields.insert("responses".to_string(), DocumentValue::Array(responses));
        ParticipantDocument {
            id: id.to_string(),
            fields,
        }
    }

    #[tokio::test]
    async fn test_extract_reads_configured_collection() {
        let source = MockSource::new(vec![participant("P1", &["a"])]);
        let requested = source.requested.clone();
        let pipeline = ExportPipeline::new(source, MockStorage::new(), MockConfig::new());

        let documents = pipeline.extract().await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(*requested.lock().await, vec!["participants".to_string()]);
    }

    #[tokio::test]
    async fn test_transform_expands_responses() {
        let pipeline =
            ExportPipeline::new(MockSource::new(vec![]), MockStorage::new(), MockConfig::new());

        let table = pipeline
            .transform(vec![participant("P1", &["a", "b"]), participant("P2", &[])])
            .await
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.unique_participants(), 1);
    }

    #[tokio::test]
    async fn test_load_writes_csv_and_reports_summary() {
        let storage = MockStorage::new();
        let pipeline =
            ExportPipeline::new(MockSource::new(vec![]), storage.clone(), MockConfig::new());

        let table = pipeline
            .transform(vec![participant("P1", &["a", "b"]), participant("P2", &["c"])])
            .await
            .unwrap();
        let summary = pipeline.load(table).await.unwrap();

        assert_eq!(
            summary,
            ExportSummary {
                output_path: "study_results.csv".to_string(),
                total_responses: 3,
                unique_participants: 2,
            }
        );

        let csv_data = storage.get_file("study_results.csv").await.unwrap();
        let text = String::from_utf8(csv_data).unwrap();
        assert_eq!(text.lines().count(), 4); // Header + 3 rows
        assert!(text.starts_with("prolific_id,start_time,"));
    }

    #[tokio::test]
    async fn test_load_empty_table_writes_header_only() {
        let storage = MockStorage::new();
        let pipeline =
            ExportPipeline::new(MockSource::new(vec![]), storage.clone(), MockConfig::new());

        let table = pipeline.transform(vec![participant("P1", &[])]).await.unwrap();
        assert!(table.is_empty());
        let summary = pipeline.load(table).await.unwrap();

        assert_eq!(summary.total_responses, 0);
        assert_eq!(summary.unique_participants, 0);
        let text = String::from_utf8(storage.get_file("study_results.csv").await.unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_load_propagates_write_failure() {
        let pipeline = ExportPipeline::new(MockSource::new(vec![]), FailingStorage, MockConfig::new());

        let result = pipeline.load(ExportTable::default()).await;

        assert!(matches!(result, Err(EtlError::IoError(_))));
    }
}
