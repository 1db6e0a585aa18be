use crate::adapters::http::HttpFetcher;
use crate::adapters::kmdb::KmdbClient;
use crate::adapters::omdb::OmdbClient;
use crate::config::MetadataConfig;
use crate::core::matcher::titles_match;
use crate::domain::model::{MovieRecord, NOT_FOUND_MESSAGE};
use crate::domain::ports::MetadataProvider;
use crate::utils::error::{ProviderError, Result};

/// Tries each provider in order and returns the first acceptable record, or
/// a failed record when every provider misses.
pub struct MetadataResolver {
    providers: Vec<Box<dyn MetadataProvider>>,
    strict_title_match: bool,
}

impl MetadataResolver {
    pub fn new(providers: Vec<Box<dyn MetadataProvider>>, strict_title_match: bool) -> Self {
        Self {
            providers,
            strict_title_match,
        }
    }

    /// KMDB 優先，OMDb 備援
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        let http = HttpFetcher::new(config)?;
        let kmdb = KmdbClient::new(http.clone(), config.kmdb.clone());
        let omdb = OmdbClient::new(http, config.omdb.clone());

        Ok(Self::new(
            vec![Box::new(kmdb), Box::new(omdb)],
            config.strict_title_match,
        ))
    }

    fn accepts(&self, query: &str, record: &MovieRecord) -> bool {
        !self.strict_title_match
            || titles_match(query, &record.title)
            || titles_match(query, &record.english_title)
    }

    pub async fn resolve(&self, title: &str) -> MovieRecord {
        let title = title.trim();

        for provider in &self.providers {
            match provider.lookup(title).await {
                Ok(record) if self.accepts(title, &record) => {
                    tracing::debug!("'{}' resolved by {}", title, provider.name());
                    return record;
                }
                Ok(record) => {
                    tracing::debug!(
                        "{} result '{}' rejected for '{}' by strict title match",
                        provider.name(),
                        record.title,
                        title
                    );
                }
                Err(e @ ProviderError::NotFound { .. }) => tracing::debug!("{}", e),
                Err(e @ ProviderError::CallFailed { .. }) => tracing::warn!("{}", e),
            }
        }

        tracing::info!("No provider could resolve '{}'", title);
        MovieRecord::failed(title, NOT_FOUND_MESSAGE)
    }
}
