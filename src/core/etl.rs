use crate::core::Pipeline;
use crate::domain::model::ExportSummary;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<ExportSummary> {
        tracing::info!("🚀 Starting export...");
        self.monitor.log_stats("Start");

        // Extract
        let documents = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} participant documents", documents.len());
        self.monitor.log_stats("Extract");

        // Transform
        let table = self.pipeline.transform(documents).await?;
        tracing::info!("🔄 Flattened into {} response rows", table.len());
        self.monitor.log_stats("Transform");

        // Load
        let summary = self.pipeline.load(table).await?;
        tracing::info!("💾 Output saved to: {}", summary.output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ExportTable, ParticipantDocument, ResponseRow};
    use crate::utils::error::EtlError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubPipeline {
        fail_extract: bool,
        loads: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<Vec<ParticipantDocument>> {
            if self.fail_extract {
                return Err(EtlError::AuthError {
                    message: "token rejected".to_string(),
                });
            }
            Ok(vec![])
        }

        async fn transform(&self, _data: Vec<ParticipantDocument>) -> Result<ExportTable> {
            Ok(ExportTable {
                rows: vec![ResponseRow::default(), ResponseRow::default()],
            })
        }

        async fn load(&self, table: ExportTable) -> Result<ExportSummary> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(ExportSummary {
                output_path: "out.csv".to_string(),
                total_responses: table.len(),
                unique_participants: table.unique_participants(),
            })
        }
    }

    #[tokio::test]
    async fn test_run_returns_load_summary() {
        let loads = Arc::new(AtomicUsize::new(0));
        let engine = EtlEngine::new(StubPipeline {
            fail_extract: false,
            loads: loads.clone(),
        });

        let summary = engine.run().await.unwrap();

        assert_eq!(summary.total_responses, 2);
        assert_eq!(summary.unique_participants, 1);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extract_failure_aborts_before_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let engine = EtlEngine::new(StubPipeline {
            fail_extract: true,
            loads: loads.clone(),
        });

        let result = engine.run().await;

        assert!(matches!(result, Err(EtlError::AuthError { .. })));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }
}
