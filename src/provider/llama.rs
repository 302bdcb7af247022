use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::ProviderSettings;

/// Base delay between retries (exponential backoff base)
const RETRY_DELAY_MS: u64 = 1000;

/// Client for the DefiLlama stablecoins API.
///
/// Hands back fully materialized JSON; shaping it is the processor's job.
#[derive(Clone)]
pub struct LlamaClient {
    http: Client,
    base_url: Url,
    include_prices: bool,
    max_retries: u32,
}

impl LlamaClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build provider HTTP client")?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .with_context(|| format!("Invalid provider base URL: {}", settings.base_url))?;

        Ok(Self {
            http,
            base_url,
            include_prices: settings.include_prices,
            max_retries: settings.max_retries,
        })
    }

    /// URL of the all-assets listing.
    pub fn stablecoins_url(&self) -> Result<Url> {
        let mut url = self.base_url.join("stablecoins")?;
        url.query_pairs_mut()
            .append_pair("includePrices", if self.include_prices { "true" } else { "false" });
        Ok(url)
    }

    /// URL of one asset's detail, including its per-chain balance history.
    pub fn stablecoin_url(&self, id: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("stablecoin/{}", id))?)
    }

    /// Fetch the listing: `{"peggedAssets": [...]}`.
    pub async fn get_stablecoins(&self) -> Result<Value> {
        self.get_json(self.stablecoins_url()?).await
    }

    /// Fetch one asset's detail response.
    pub async fn get_stablecoin(&self, id: &str) -> Result<Value> {
        self.get_json(self.stablecoin_url(id)?).await
    }

    /// Execute a GET request, retrying on 429 and 5xx.
    async fn get_json(&self, url: Url) -> Result<Value> {
        let mut retries = 0u32;

        loop {
            debug!("GET {}", url);
            let resp = self
                .http
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Request to {} failed", url))?;

            let status = resp.status();
            if should_retry(status) {
                retries += 1;
                if retries > self.max_retries {
                    anyhow::bail!(
                        "Provider returned {} for {} after {} retries",
                        status,
                        url,
                        self.max_retries
                    );
                }
                let wait = Duration::from_millis(RETRY_DELAY_MS * 2u64.pow(retries - 1));
                warn!(
                    "Provider returned {}, retrying in {:?} (attempt {}/{})",
                    status, wait, retries, self.max_retries
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Provider error {} for {}: {}", status, url, body);
            }

            return resp
                .json::<Value>()
                .await
                .with_context(|| format!("Failed to decode JSON from {}", url));
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str, include_prices: bool) -> LlamaClient {
        LlamaClient::new(&ProviderSettings {
            base_url: base_url.to_string(),
            include_prices,
            ..ProviderSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_listing_url() {
        let c = client("https://stablecoins.llama.fi", true);
        assert_eq!(
            c.stablecoins_url().unwrap().as_str(),
            "https://stablecoins.llama.fi/stablecoins?includePrices=true"
        );

        let c = client("https://stablecoins.llama.fi/", false);
        assert_eq!(
            c.stablecoins_url().unwrap().as_str(),
            "https://stablecoins.llama.fi/stablecoins?includePrices=false"
        );
    }

    #[test]
    fn test_detail_url_keeps_base_path() {
        let c = client("http://localhost:8080/proxy", true);
        assert_eq!(
            c.stablecoin_url("146").unwrap().as_str(),
            "http://localhost:8080/proxy/stablecoin/146"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = ProviderSettings {
            base_url: "not a url".to_string(),
            ..ProviderSettings::default()
        };
        assert!(LlamaClient::new(&settings).is_err());
    }

    #[test]
    fn test_retry_policy() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::BAD_GATEWAY));
        assert!(should_retry(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!should_retry(StatusCode::NOT_FOUND));
        assert!(!should_retry(StatusCode::OK));
    }
}
