use crate::adapters::http::HttpFetcher;
use crate::config::ProviderSettings;
use crate::core::matcher::{best_candidate, clean_title};
use crate::core::rating::normalize_rating;
use crate::domain::model::{truncate_cast, MovieRecord, Source};
use crate::domain::ports::MetadataProvider;
use crate::utils::error::{MetaError, ProviderError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const PROVIDER: &str = "KMDB";

#[derive(Debug, Deserialize)]
struct KmdbResponse {
    #[serde(rename = "Data", default)]
    data: Vec<KmdbCollection>,
}

#[derive(Debug, Deserialize)]
struct KmdbCollection {
    #[serde(rename = "Result", default)]
    result: Vec<KmdbMovie>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KmdbMovie {
    title: String,
    title_eng: String,
    prod_year: String,
    nation: String,
    genre: String,
    rating: String,
    runtime: String,
    rep_rls_date: String,
    posters: String,
    directors: Option<KmdbDirectors>,
    actors: Option<KmdbActors>,
    plots: Option<KmdbPlots>,
    ratings: Option<KmdbRatings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KmdbDirectors {
    director: Vec<KmdbDirector>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KmdbDirector {
    director_nm: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KmdbActors {
    actor: Vec<KmdbActor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KmdbActor {
    actor_nm: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KmdbPlots {
    plot: Vec<KmdbPlot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KmdbPlot {
    plot_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KmdbRatings {
    rating: Vec<KmdbRatingGrade>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KmdbRatingGrade {
    rating_grade: String,
}

impl KmdbMovie {
    fn into_record(self) -> MovieRecord {
        let mut record = MovieRecord::new(Source::Primary, clean_title(&self.title));

        record.english_title = clean_title(&self.title_eng).to_uppercase();
        record.year = self.prod_year.trim().to_string();
        record.release_date = self.rep_rls_date.trim().to_string();
        record.director = self
            .directors
            .and_then(|d| d.director.into_iter().next())
            .map(|d| clean_title(&d.director_nm))
            .unwrap_or_default();
        record.cast = truncate_cast(
            self.actors
                .map(|a| a.actor)
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.actor_nm),
        );
        record.genre = self.genre.trim().to_string();
        record.country = self.nation.trim().to_string();
        record.plot = self
            .plots
            .and_then(|p| {
                p.plot
                    .into_iter()
                    .map(|plot| plot.plot_text.trim().to_string())
                    .find(|text| !text.is_empty())
            })
            .unwrap_or_default();

        // 主要分級欄位為空時改用 ratings 清單的第一筆
        let raw_rating = if self.rating.trim().is_empty() {
            self.ratings
                .and_then(|r| r.rating.into_iter().next())
                .map(|r| r.rating_grade)
                .unwrap_or_default()
        } else {
            self.rating
        };
        record.rating = normalize_rating(Some(&raw_rating));

        record.poster_url = self
            .posters
            .split('|')
            .map(str::trim)
            .find(|p| !p.is_empty())
            .map(str::to_string);
        record.runtime = Some(self.runtime.trim().to_string()).filter(|r| !r.is_empty());

        record
    }
}

/// Korean film database (KMDB) search client.
pub struct KmdbClient {
    http: HttpFetcher,
    settings: ProviderSettings,
}

impl KmdbClient {
    pub fn new(http: HttpFetcher, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }

    fn search_url(&self, title: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.settings.endpoint,
            &[
                ("collection", "kmdb_new2"),
                ("detail", "Y"),
                ("query", title),
                ("ServiceKey", self.settings.api_key.as_str()),
            ],
        )
        .map_err(|e| MetaError::ConfigError {
            message: format!("Invalid KMDB endpoint: {}", e),
        })
    }
}

#[async_trait]
impl MetadataProvider for KmdbClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn lookup(&self, title: &str) -> std::result::Result<MovieRecord, ProviderError> {
        let url = self
            .search_url(title)
            .map_err(|e| ProviderError::call_failed(PROVIDER, e))?;

        let response: KmdbResponse = self
            .http
            .get_json(url)
            .await
            .map_err(|e| ProviderError::call_failed(PROVIDER, e))?;

        let mut results = response
            .data
            .into_iter()
            .next()
            .map(|collection| collection.result)
            .unwrap_or_default();

        if results.is_empty() {
            return Err(ProviderError::not_found(PROVIDER, "empty result list"));
        }

        let index = best_candidate(
            title,
            results
                .iter()
                .map(|m| [m.title.as_str(), m.title_eng.as_str()]),
        )
        .unwrap_or(0);
        tracing::debug!(
            "KMDB returned {} result(s) for '{}', picked #{}",
            results.len(),
            title,
            index
        );

        Ok(results.swap_remove(index).into_record())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataConfig;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer, use_proxy: bool) -> KmdbClient {
        let mut config = MetadataConfig::default();
        config.kmdb = ProviderSettings {
            endpoint: server.url("/search_json2.jsp"),
            api_key: "test-key".to_string(),
        };
        config.proxy.endpoint = server.url("/raw");
        config.proxy.use_proxy = use_proxy;

        let http = HttpFetcher::new(&config).unwrap();
        KmdbClient::new(http, config.kmdb)
    }

    fn oldboy_json() -> serde_json::Value {
        serde_json::json!({
            "Query": "올드보이",
            "TotalCount": 1,
            "Data": [{
                "CollName": "kmdb_new2",
                "TotalCount": 1,
                "Result": [{
                    "title": " !HS올드보이!HE ",
                    "titleEng": "oldboy",
                    "prodYear": "2003",
                    "nation": "대한민국",
                    "genre": "스릴러,미스터리",
                    "rating": "18세관람가",
                    "runtime": "120",
                    "repRlsDate": "20031121",
                    "posters": "http://file.koreafilm.or.kr/poster1.jpg|http://file.koreafilm.or.kr/poster2.jpg",
                    "directors": {"director": [{"directorNm": "박찬욱", "directorEnNm": "Park Chan-wook"}]},
                    "actors": {"actor": [
                        {"actorNm": "최민식"}, {"actorNm": "유지태"}, {"actorNm": "강혜정"},
                        {"actorNm": "지대한"}, {"actorNm": "오광록"}, {"actorNm": "윤진서"}
                    ]},
                    "plots": {"plot": [{"plotLang": "한국어", "plotText": "15년 동안 감금된 남자."}]}
                }]
            }]
        })
    }

    #[tokio::test]
    async fn test_lookup_parses_first_result() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search_json2.jsp")
                .query_param("collection", "kmdb_new2")
                .query_param("detail", "Y")
                .query_param("query", "올드보이")
                .query_param("ServiceKey", "test-key");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(oldboy_json());
        });

        let record = client_for(&server, false).lookup("올드보이").await.unwrap();

        api_mock.assert();
        assert_eq!(record.source, Source::Primary);
        assert_eq!(record.title, "올드보이");
        assert_eq!(record.english_title, "OLDBOY");
        assert_eq!(record.year, "2003");
        assert_eq!(record.director, "박찬욱");
        assert_eq!(record.cast, vec!["최민식", "유지태", "강혜정", "지대한"]);
        assert_eq!(record.rating, "18+");
        assert_eq!(record.plot, "15년 동안 감금된 남자.");
        assert_eq!(record.country, "대한민국");
        assert_eq!(record.release_date, "20031121");
        assert_eq!(
            record.poster_url.as_deref(),
            Some("http://file.koreafilm.or.kr/poster1.jpg")
        );
        assert_eq!(record.runtime.as_deref(), Some("120"));
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_lookup_empty_result_is_not_found() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(200).json_body(serde_json::json!({
                "TotalCount": 0,
                "Data": [{"CollName": "kmdb_new2", "TotalCount": 0, "Count": 0}]
            }));
        });

        let err = client_for(&server, false).lookup("없는영화").await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, ProviderError::NotFound { provider: "KMDB", .. }));
    }

    #[tokio::test]
    async fn test_lookup_missing_data_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(200).json_body(serde_json::json!({"TotalCount": 0}));
        });

        let err = client_for(&server, false).lookup("없는영화").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_call_failed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(500);
        });

        let err = client_for(&server, false).lookup("올드보이").await.unwrap_err();
        assert!(matches!(err, ProviderError::CallFailed { provider: "KMDB", .. }));
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_call_failed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(200)
                .delay(std::time::Duration::from_secs(2))
                .json_body(oldboy_json());
        });

        let mut config = MetadataConfig::default();
        config.request_timeout_seconds = 1;
        let settings = ProviderSettings {
            endpoint: server.url("/search_json2.jsp"),
            api_key: "test-key".to_string(),
        };
        let client = KmdbClient::new(HttpFetcher::new(&config).unwrap(), settings);

        let err = client.lookup("올드보이").await.unwrap_err();
        assert!(matches!(err, ProviderError::CallFailed { provider: "KMDB", .. }));
    }

    #[tokio::test]
    async fn test_lookup_invalid_json_is_call_failed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(200).body("<html>not json</html>");
        });

        let err = client_for(&server, false).lookup("올드보이").await.unwrap_err();
        assert!(matches!(err, ProviderError::CallFailed { .. }));
    }

    #[tokio::test]
    async fn test_lookup_picks_best_match() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(200).json_body(serde_json::json!({
                "Data": [{
                    "Result": [
                        {"title": "!HS올드보이!HE 리마스터", "titleEng": "Oldboy Remastered", "prodYear": "2023"},
                        {"title": "!HS올드보이!HE", "titleEng": "Oldboy", "prodYear": "2003",
                         "ratings": {"rating": [{"ratingGrade": "청소년관람불가"}]}}
                    ]
                }]
            }));
        });

        let record = client_for(&server, false).lookup("올드보이").await.unwrap();
        assert_eq!(record.year, "2003");
        assert_eq!(record.rating, "18+");
        assert!(record.poster_url.is_none());
        assert!(record.runtime.is_none());
    }

    #[tokio::test]
    async fn test_lookup_through_proxy() {
        let server = MockServer::start();
        let proxy_mock = server.mock(|when, then| {
            when.method(GET).path("/raw").query_param_exists("url");
            then.status(200).json_body(oldboy_json());
        });
        let direct_mock = server.mock(|when, then| {
            when.method(GET).path("/search_json2.jsp");
            then.status(200).json_body(oldboy_json());
        });

        let record = client_for(&server, true).lookup("올드보이").await.unwrap();

        proxy_mock.assert();
        assert_eq!(direct_mock.hits(), 0);
        assert_eq!(record.english_title, "OLDBOY");
    }
}
