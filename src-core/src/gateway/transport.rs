use async_trait::async_trait;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::errors::Result;
use crate::gateway::gateway_model::RawResponse;

/// HTTP exchange with the remote data service.
///
/// Any finished exchange is `Ok`, whatever its status; `Err` means the
/// request never produced a response (DNS, refused connection, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, path: &str, body: &Value) -> Result<RawResponse>;

    async fn get(&self, path: &str, bearer: &str) -> Result<RawResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<RawResponse> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    async fn get(&self, path: &str, bearer: &str) -> Result<RawResponse> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(bearer)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
