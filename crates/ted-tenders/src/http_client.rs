//! Async HTTP client wrapping reqwest, shared by the service adapters.
//!
//! One attempt per request: no retries and no backoff. A failed call is
//! reported to the caller, which decides how the row degrades.

use std::time::Duration;

use serde::de::DeserializeOwned;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client for the translation and exchange-rate services.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with a desktop user agent and a per-request timeout.
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Perform a single GET request with query parameters.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, reqwest::Error> {
        let r = self.client.get(url).query(query).send().await?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let body = r.text().await?;

        tracing::debug!(url = %final_url, status, bytes = body.len(), "GET");

        Ok(HttpResponse {
            final_url,
            status,
            body,
        })
    }
}
