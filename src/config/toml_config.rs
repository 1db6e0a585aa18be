use crate::config::{
    MetadataConfig, ProviderSettings, ProxySettings, DEFAULT_KMDB_ENDPOINT, DEFAULT_OMDB_ENDPOINT,
    DEFAULT_PROXY_ENDPOINT, DEFAULT_TIMEOUT_SECONDS,
};
use crate::utils::error::{MetaError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub providers: ProvidersConfig,
    pub proxy: Option<ProxyConfig>,
    pub resolver: Option<ResolverConfig>,
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub kmdb: KmdbConfig,
    pub omdb: OmdbConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmdbConfig {
    pub endpoint: Option<String>,
    pub service_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    pub endpoint: Option<String>,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub strict_title_match: Option<bool>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub skip_header: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MetaError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${KMDB_SERVICE_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MetaError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 取得輸出目錄
    pub fn output_directory(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.directory.as_deref())
    }

    pub fn into_metadata_config(self) -> MetadataConfig {
        let resolver = self.resolver.as_ref();

        MetadataConfig {
            kmdb: ProviderSettings {
                endpoint: self
                    .providers
                    .kmdb
                    .endpoint
                    .unwrap_or_else(|| DEFAULT_KMDB_ENDPOINT.to_string()),
                api_key: self.providers.kmdb.service_key,
            },
            omdb: ProviderSettings {
                endpoint: self
                    .providers
                    .omdb
                    .endpoint
                    .unwrap_or_else(|| DEFAULT_OMDB_ENDPOINT.to_string()),
                api_key: self.providers.omdb.api_key,
            },
            proxy: match self.proxy {
                Some(proxy) => ProxySettings {
                    endpoint: proxy
                        .endpoint
                        .unwrap_or_else(|| DEFAULT_PROXY_ENDPOINT.to_string()),
                    use_proxy: proxy.enabled,
                },
                None => ProxySettings::default(),
            },
            strict_title_match: resolver
                .and_then(|r| r.strict_title_match)
                .unwrap_or(false),
            skip_header: self
                .input
                .as_ref()
                .and_then(|i| i.skip_header)
                .unwrap_or(false),
            request_timeout_seconds: resolver
                .and_then(|r| r.request_timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.clone().into_metadata_config().validate()
    }
}
