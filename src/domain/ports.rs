use crate::domain::model::{ExportSummary, ExportTable, ParticipantDocument};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 文件來源：依序列出整個集合的文件
pub trait DocumentSource: Send + Sync {
    fn list_documents(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ParticipantDocument>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn collection(&self) -> &str;
    fn output_path(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ParticipantDocument>>;
    async fn transform(&self, data: Vec<ParticipantDocument>) -> Result<ExportTable>;
    async fn load(&self, table: ExportTable) -> Result<ExportSummary>;
}
