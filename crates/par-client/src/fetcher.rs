use std::time::Duration;

use par_core::config::FetchConfig;
use par_core::error::AppError;
use par_core::models::{FetchRequest, FetchResult};
use par_core::throttle::RateLimitedFetcher;
use par_core::traits::Fetcher;
use reqwest::{Client, Method};
use url::Url;

/// HTTP fetcher using reqwest.
///
/// Sends requests with a fixed User-Agent and timeout and reads at most
/// `max_body_bytes` of the response. Status codes are passed through
/// untouched; deciding what a 4xx/5xx means is the caller's job.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
    max_body_bytes: u64,
}

impl ReqwestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::NetworkError(e.to_string())
        }
    }
}

/// Build the rate-limited client used for a whole run.
///
/// Validates `config` first; one instance should serve every request of
/// the run so that all of them share one token bucket.
pub fn polite_client(config: &FetchConfig) -> Result<RateLimitedFetcher<ReqwestFetcher>, AppError> {
    config.validate()?;
    let inner = ReqwestFetcher::new(config)?;
    Ok(RateLimitedFetcher::new(
        inner,
        config.requests_per_second,
        config.burst,
    ))
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, AppError> {
        validate_url(&request.url)?;

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| AppError::NetworkError(format!("Invalid method {}: {e}", request.method)))?;
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len > self.max_body_bytes
        {
            tracing::warn!(url = %request.url, len, limit = self.max_body_bytes, "Response too large");
            return Err(AppError::BodyTooLarge {
                limit: self.max_body_bytes,
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_send_error(e))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                tracing::warn!(url = %request.url, limit = self.max_body_bytes, "Response too large");
                return Err(AppError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %request.url, status, bytes = body.len(), "Response received");
        Ok(FetchResult { status, body })
    }
}

/// Only absolute `http`/`https` URLs are fetched.
fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::NetworkError(format!("Invalid URL {url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::NetworkError(format!(
            "URL scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}
