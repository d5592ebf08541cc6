use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::{ResourceFetcher, is_remote};
use crate::foundation::error::{PromoError, PromoResult};

/// Error body returned by the image proxy on failure.
#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    error: String,
}

/// Build the proxy request URL `endpoint?url=<percent-encoded target>`.
pub fn proxy_url(endpoint: &str, target: &str) -> PromoResult<String> {
    let url = url::Url::parse_with_params(endpoint, &[("url", target)]).map_err(|e| {
        PromoError::validation(format!("invalid proxy endpoint '{endpoint}': {e}"))
    })?;
    Ok(url.into())
}

/// Turn a non-success proxy response into a message, preferring the `{ "error": ... }` body.
pub fn parse_proxy_error(status: u16, body: &[u8]) -> String {
    match serde_json::from_slice::<ProxyErrorBody>(body) {
        Ok(b) => format!("proxy returned {status}: {}", b.error),
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            if text.is_empty() {
                format!("proxy returned {status}")
            } else {
                format!("proxy returned {status}: {text}")
            }
        }
    }
}

/// Fetches remote images through the same-origin image proxy.
///
/// Local paths are not supported; pair with [`FsFetcher`](crate::fetch::FsFetcher) for those.
#[derive(Clone, Debug)]
pub struct ProxyFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxyFetcher {
    /// `endpoint` is the full proxy route, e.g. `http://localhost:3000/proxy`.
    pub fn new(endpoint: impl Into<String>) -> PromoResult<Self> {
        let endpoint = endpoint.into();
        // The endpoint must be an absolute URL.
        proxy_url(&endpoint, "https://example.invalid/")?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PromoError::validation(format!("build http client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResourceFetcher for ProxyFetcher {
    async fn fetch(&self, url: &str) -> PromoResult<Vec<u8>> {
        if !is_remote(url) {
            return Err(PromoError::resource_load(format!(
                "'{url}' is not an http(s) url"
            )));
        }
        let request_url = proxy_url(&self.endpoint, url)?;
        tracing::debug!(%url, "fetching through image proxy");

        let resp = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| PromoError::resource_load(format!("fetch '{url}' via proxy: {e}")))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| PromoError::resource_load(format!("read proxy body for '{url}': {e}")))?;

        if !status.is_success() {
            return Err(PromoError::resource_load(format!(
                "'{url}': {}",
                parse_proxy_error(status.as_u16(), &body)
            )));
        }
        Ok(body.to_vec())
    }
}
