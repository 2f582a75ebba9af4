//! HTTP transport used by the request queue.

use super::error::TransportError;
use super::queue::{RawResponse, RequestSpec};
use super::types::ApiErrorBody;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Something that can carry out one [`RequestSpec`]
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &RequestSpec,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// reqwest-backed transport against a base URL
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, TransportError> {
        let url = self.url(&request.path);

        let response = self
            .client
            .request(request.method.clone(), &url)
            .query(&request.query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(url = %url, status = %status, bytes = body.len(), "Response received");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Message from a Jikan error body, or the start of the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(error) => error.message,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_creation() {
        let transport = HttpTransport::new(
            "https://api.jikan.moe/v4/",
            Duration::from_secs(10),
            "anidex-test",
        );
        assert!(transport.is_ok());
        assert_eq!(
            transport.unwrap().url("/anime/1/full"),
            "https://api.jikan.moe/v4/anime/1/full"
        );
    }

    #[test]
    fn test_error_message_prefers_jikan_body() {
        let body = r#"{"status":429,"type":"RateLimitException","message":"You are being rate-limited.","error":null}"#;
        assert_eq!(error_message(body), "You are being rate-limited.");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response body");
    }
}
