#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_KMDB_ENDPOINT: &str =
    "https://api.koreafilm.or.kr/openapi-data2/wisenut/search_api/search_json2.jsp";
pub const DEFAULT_OMDB_ENDPOINT: &str = "https://www.omdbapi.com/";
pub const DEFAULT_PROXY_ENDPOINT: &str = "https://api.allorigins.win/raw";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub endpoint: String,
    pub use_proxy: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            use_proxy: false,
        }
    }
}

/// 查詢所需的全部設定，建立後不再變動
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub kmdb: ProviderSettings,
    pub omdb: ProviderSettings,
    pub proxy: ProxySettings,
    pub strict_title_match: bool,
    pub skip_header: bool,
    pub request_timeout_seconds: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            kmdb: ProviderSettings {
                endpoint: DEFAULT_KMDB_ENDPOINT.to_string(),
                api_key: String::new(),
            },
            omdb: ProviderSettings {
                endpoint: DEFAULT_OMDB_ENDPOINT.to_string(),
                api_key: String::new(),
            },
            proxy: ProxySettings::default(),
            strict_title_match: false,
            skip_header: false,
            request_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl MetadataConfig {
    /// 從環境變數載入設定，未設定的項目使用預設值
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = env::var("KMDB_SERVICE_KEY") {
            config.kmdb.api_key = key;
        }
        if let Ok(key) = env::var("OMDB_API_KEY") {
            config.omdb.api_key = key;
        }
        if let Ok(endpoint) = env::var("KMDB_ENDPOINT") {
            config.kmdb.endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("OMDB_ENDPOINT") {
            config.omdb.endpoint = endpoint;
        }
        if let Ok(flag) = env::var("MOVIE_META_USE_PROXY") {
            config.proxy.use_proxy = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Validate for MetadataConfig {
    fn validate(&self) -> Result<()> {
        validate_url("kmdb.endpoint", &self.kmdb.endpoint)?;
        validate_non_empty_string("kmdb.api_key", &self.kmdb.api_key)?;
        validate_url("omdb.endpoint", &self.omdb.endpoint)?;
        validate_non_empty_string("omdb.api_key", &self.omdb.api_key)?;

        if self.proxy.use_proxy {
            validate_url("proxy.endpoint", &self.proxy.endpoint)?;
        }

        validate_range("request_timeout_seconds", self.request_timeout_seconds, 1, 300)?;
        Ok(())
    }
}
