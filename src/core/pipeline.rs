use crate::adapters::xlsx;
use crate::core::resolver::MetadataResolver;
use crate::domain::model::{MovieRecord, MovieRequest};
use crate::domain::ports::Pipeline;
use crate::utils::error::{MetaError, Result};

/// Titles in, records through the resolver, workbook bytes out.
pub struct MoviePipeline {
    resolver: MetadataResolver,
    skip_header: bool,
}

impl MoviePipeline {
    pub fn new(resolver: MetadataResolver, skip_header: bool) -> Self {
        Self {
            resolver,
            skip_header,
        }
    }
}

#[async_trait::async_trait]
impl Pipeline for MoviePipeline {
    async fn extract(&self, request: &MovieRequest) -> Result<Vec<String>> {
        match request {
            MovieRequest::Title(title) => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(MetaError::InputMissing);
                }
                Ok(vec![title.to_string()])
            }
            MovieRequest::File(bytes) => {
                let titles = xlsx::read_titles(bytes, self.skip_header)?;
                tracing::debug!("Extracted {} title(s) from spreadsheet", titles.len());
                Ok(titles)
            }
        }
    }

    async fn transform(&self, titles: Vec<String>) -> Result<Vec<MovieRecord>> {
        let total = titles.len();
        let mut records = Vec::with_capacity(total);

        // 逐筆依序查詢，輸出順序與輸入相同
        for (index, title) in titles.iter().enumerate() {
            tracing::debug!("[{}/{}] Resolving '{}'", index + 1, total, title);
            records.push(self.resolver.resolve(title).await);
        }

        Ok(records)
    }

    async fn load(&self, records: &[MovieRecord]) -> Result<Vec<u8>> {
        xlsx::write_workbook(records)
    }
}
