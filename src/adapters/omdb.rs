use crate::adapters::http::HttpFetcher;
use crate::config::ProviderSettings;
use crate::core::rating::normalize_rating;
use crate::domain::model::{truncate_cast, MovieRecord, Source};
use crate::domain::ports::MetadataProvider;
use crate::utils::error::{MetaError, ProviderError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const PROVIDER: &str = "OMDb";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct OmdbResponse {
    response: String,
    error: String,
    title: String,
    year: String,
    rated: String,
    released: String,
    runtime: String,
    genre: String,
    director: String,
    actors: String,
    plot: String,
    country: String,
    poster: String,
    #[serde(rename = "imdbRating")]
    imdb_rating: String,
}

/// OMDb 以 "N/A" 表示缺值
fn present(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != "N/A").then_some(value)
}

fn text(value: &str) -> String {
    present(value).unwrap_or_default().to_string()
}

impl OmdbResponse {
    fn into_record(self) -> MovieRecord {
        let title = text(&self.title);
        let mut record = MovieRecord::new(Source::Secondary, title.clone());

        record.english_title = title.to_uppercase();
        record.year = text(&self.year);
        record.release_date = text(&self.released);
        record.director = text(&self.director);
        record.cast = truncate_cast(present(&self.actors).unwrap_or_default().split(','));
        record.genre = text(&self.genre);
        record.country = text(&self.country);
        record.plot = text(&self.plot);
        record.rating = normalize_rating(present(&self.rated));
        record.runtime = present(&self.runtime).map(str::to_string);
        record.poster_url = present(&self.poster).map(str::to_string);
        record.imdb_rating = present(&self.imdb_rating).map(str::to_string);

        record
    }
}

/// International movie database (OMDb) exact-title client.
pub struct OmdbClient {
    http: HttpFetcher,
    settings: ProviderSettings,
}

impl OmdbClient {
    pub fn new(http: HttpFetcher, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }

    fn lookup_url(&self, title: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.settings.endpoint,
            &[
                ("t", title),
                ("apikey", self.settings.api_key.as_str()),
                ("plot", "full"),
            ],
        )
        .map_err(|e| MetaError::ConfigError {
            message: format!("Invalid OMDb endpoint: {}", e),
        })
    }
}

#[async_trait]
impl MetadataProvider for OmdbClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn lookup(&self, title: &str) -> std::result::Result<MovieRecord, ProviderError> {
        let url = self
            .lookup_url(title)
            .map_err(|e| ProviderError::call_failed(PROVIDER, e))?;

        let response: OmdbResponse = self
            .http
            .get_json(url)
            .await
            .map_err(|e| ProviderError::call_failed(PROVIDER, e))?;

        if response.response.eq_ignore_ascii_case("false") {
            let reason = present(&response.error).unwrap_or("Response=False");
            return Err(ProviderError::not_found(PROVIDER, reason));
        }
        if present(&response.title).is_none() {
            return Err(ProviderError::not_found(PROVIDER, "missing Title"));
        }

        Ok(response.into_record())
    }
}
