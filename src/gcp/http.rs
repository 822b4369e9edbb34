//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Pull `error.message` out of a Google API error body
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(sanitize_for_log)
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gcp-sweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.send(Method::GET, url, token, query).await
    }

    /// Make a POST request to a GCP API (no body)
    pub async fn post(&self, url: &str, token: &str) -> Result<Value> {
        self.send(Method::POST, url, token, &[]).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value> {
        self.send(Method::DELETE, url, token, &[]).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::debug!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(api_failure(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

fn api_failure(status: StatusCode, body: &str) -> anyhow::Error {
    match api_error_message(body) {
        Some(message) => anyhow::anyhow!("API request failed: {} - {}", status, message),
        None => anyhow::anyhow!("API request failed: {}", status),
    }
}

/// Short operator hint for a GCP API error
///
/// Looks at the whole context chain, since callers wrap the API failure.
pub fn format_gcp_error(error: &anyhow::Error) -> &'static str {
    let error_str = format!("{:#}", error);

    if error_str.contains("403") {
        return "permission denied, check IAM permissions";
    }
    if error_str.contains("401") {
        return "authentication failed, run 'gcloud auth application-default login'";
    }
    if error_str.contains("404") {
        return "resource not found";
    }
    if error_str.contains("429") {
        return "rate limit exceeded";
    }
    if error_str.contains("409") {
        return "resource conflict, it may be in use";
    }
    if error_str.contains("400") {
        return "invalid request";
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "GCP service temporarily unavailable";
    }

    "request failed"
}
