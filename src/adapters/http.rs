use crate::config::{MetadataConfig, ProxySettings};
use crate::utils::error::{MetaError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// Shared HTTP access for the provider clients: one reqwest client with the
/// configured timeout, plus optional routing through a CORS relay.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    proxy: Option<ProxySettings>,
}

impl HttpFetcher {
    pub fn new(config: &MetadataConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            proxy: config.proxy.use_proxy.then(|| config.proxy.clone()),
        })
    }

    /// 開啟代理時，目標網址以 `url` 參數包進代理端點
    pub fn route(&self, target: Url) -> Result<Url> {
        match &self.proxy {
            Some(proxy) => {
                Url::parse_with_params(&proxy.endpoint, &[("url", target.as_str())]).map_err(|e| {
                    MetaError::ConfigError {
                        message: format!("Invalid proxy endpoint {}: {}", proxy.endpoint, e),
                    }
                })
            }
            None => Ok(target),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, target: Url) -> Result<T> {
        let url = self.route(target)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        tracing::debug!("Response status: {}", response.status());

        let body = response.error_for_status()?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
