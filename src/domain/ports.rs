use crate::domain::model::{MovieRecord, MovieRequest};
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 外部電影資料來源
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn lookup(&self, title: &str) -> std::result::Result<MovieRecord, ProviderError>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, request: &MovieRequest) -> Result<Vec<String>>;
    async fn transform(&self, titles: Vec<String>) -> Result<Vec<MovieRecord>>;
    async fn load(&self, records: &[MovieRecord]) -> Result<Vec<u8>>;
}
