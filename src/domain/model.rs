use chrono::{DateTime, TimeZone};
use crate::utils::error::{MetaError, Result};
use serde::{Deserialize, Serialize};

/// 一筆記錄最多保留的演員數
pub const MAX_CAST: usize = 4;

pub const NOT_FOUND_MESSAGE: &str = "No metadata found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Primary,
    Secondary,
    None,
}

impl Source {
    /// 試算表中顯示的來源名稱
    pub fn label(&self) -> &'static str {
        match self {
            Source::Primary => "KMDB",
            Source::Secondary => "OMDb",
            Source::None => "N/A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub source: Source,
    pub title: String,
    pub english_title: String,
    pub year: String,
    pub release_date: String,
    pub director: String,
    pub cast: Vec<String>,
    pub genre: String,
    pub country: String,
    pub plot: String,
    pub rating: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MovieRecord {
    /// Empty successful record for `source`; clients fill in the fields.
    pub fn new(source: Source, title: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
            english_title: String::new(),
            year: String::new(),
            release_date: String::new(),
            director: String::new(),
            cast: Vec::new(),
            genre: String::new(),
            country: String::new(),
            plot: String::new(),
            rating: String::new(),
            poster_url: None,
            runtime: None,
            imdb_rating: None,
            error: None,
        }
    }

    /// Record for a title that no provider could resolve.
    pub fn failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(Source::None, title)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.source != Source::None
    }

    pub fn cast_display(&self) -> String {
        self.cast.join(", ")
    }

    /// KMDB 記錄顯示海報，OMDb 記錄顯示片長
    pub fn poster_or_runtime(&self) -> &str {
        let value = match self.source {
            Source::Primary => self.poster_url.as_deref(),
            Source::Secondary => self.runtime.as_deref(),
            Source::None => None,
        };
        value.unwrap_or_default()
    }
}

/// Keep the first [`MAX_CAST`] non-empty names, trimmed.
pub fn truncate_cast<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .take(MAX_CAST)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieRequest {
    Title(String),
    File(Vec<u8>),
}

impl MovieRequest {
    /// 標題優先；兩者皆無時回報 InputMissing
    pub fn from_parts(title: Option<String>, file: Option<Vec<u8>>) -> Result<Self> {
        match (title, file) {
            (Some(title), _) if !title.trim().is_empty() => Ok(MovieRequest::Title(title)),
            (_, Some(file)) => Ok(MovieRequest::File(file)),
            _ => Err(MetaError::InputMissing),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metadata {
    Single(MovieRecord),
    Batch(Vec<MovieRecord>),
}

impl Metadata {
    pub fn records(&self) -> &[MovieRecord] {
        match self {
            Metadata::Single(record) => std::slice::from_ref(record),
            Metadata::Batch(records) => records,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovieResponse {
    pub metadata: Metadata,
    pub spreadsheet: Vec<u8>,
}

impl MovieResponse {
    pub fn output_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("movie-metadata-{}.xlsx", now.format("%Y%m%d%H%M%S%3f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_failed_record_has_no_source() {
        let record = MovieRecord::failed("없는영화", NOT_FOUND_MESSAGE);
        assert_eq!(record.source, Source::None);
        assert_eq!(record.error.as_deref(), Some(NOT_FOUND_MESSAGE));
        assert!(!record.is_success());
        assert!(record.director.is_empty());
    }

    #[test]
    fn test_truncate_cast_limits_to_four() {
        let cast = truncate_cast(["A", " B ", "", "C", "D", "E"]);
        assert_eq!(cast, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_poster_or_runtime_depends_on_source() {
        let mut primary = MovieRecord::new(Source::Primary, "올드보이");
        primary.poster_url = Some("http://poster".to_string());
        primary.runtime = Some("120".to_string());
        assert_eq!(primary.poster_or_runtime(), "http://poster");

        let mut secondary = MovieRecord::new(Source::Secondary, "Oldboy");
        secondary.poster_url = Some("http://poster".to_string());
        secondary.runtime = Some("120 min".to_string());
        assert_eq!(secondary.poster_or_runtime(), "120 min");
    }

    #[test]
    fn test_serialized_record_skips_missing_options() {
        let record = MovieRecord::failed("Nothing", NOT_FOUND_MESSAGE);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "None");
        assert_eq!(json["error"], NOT_FOUND_MESSAGE);
        assert!(json.get("imdbRating").is_none());
    }

    #[test]
    fn test_output_filename_uses_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            MovieResponse::output_filename(&now),
            "movie-metadata-20240309070501000.xlsx"
        );

        // 同一秒內的兩次執行不會覆蓋彼此
        let later = now + chrono::Duration::milliseconds(42);
        assert_eq!(
            MovieResponse::output_filename(&later),
            "movie-metadata-20240309070501042.xlsx"
        );
    }
}
