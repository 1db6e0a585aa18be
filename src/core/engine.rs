use crate::config::MetadataConfig;
use crate::core::pipeline::MoviePipeline;
use crate::core::resolver::MetadataResolver;
use crate::domain::model::{Metadata, MovieRequest, MovieResponse};
use crate::domain::ports::Pipeline;
use crate::utils::error::{MetaError, Result};
use crate::utils::validation::Validate;

/// Entry point: drives extract, transform and load for one request.
pub struct MetadataEngine<P: Pipeline> {
    pipeline: P,
}

impl MetadataEngine<MoviePipeline> {
    /// 先驗證設定，無效的金鑰或逾時值直接回報錯誤
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        config.validate()?;
        let resolver = MetadataResolver::from_config(config)?;
        Ok(Self::new(MoviePipeline::new(resolver, config.skip_header)))
    }
}

impl<P: Pipeline> MetadataEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run_parts(
        &self,
        title: Option<String>,
        file: Option<Vec<u8>>,
    ) -> Result<MovieResponse> {
        let request = MovieRequest::from_parts(title, file)?;
        self.run(request).await
    }

    pub async fn run(&self, request: MovieRequest) -> Result<MovieResponse> {
        tracing::info!("Starting metadata lookup");

        let titles = self.pipeline.extract(&request).await?;
        tracing::info!("Extracted {} title(s)", titles.len());

        let records = self.pipeline.transform(titles).await?;
        let resolved = records.iter().filter(|r| r.is_success()).count();
        tracing::info!("Resolved {}/{} title(s)", resolved, records.len());

        let spreadsheet = self.pipeline.load(&records).await?;
        tracing::debug!("Spreadsheet size: {} bytes", spreadsheet.len());

        let metadata = match request {
            MovieRequest::Title(_) => match records.into_iter().next() {
                Some(record) => Metadata::Single(record),
                None => {
                    return Err(MetaError::ValidationError {
                        message: "title lookup produced no record".to_string(),
                    })
                }
            },
            MovieRequest::File(_) => Metadata::Batch(records),
        };

        Ok(MovieResponse {
            metadata,
            spreadsheet,
        })
    }
}
