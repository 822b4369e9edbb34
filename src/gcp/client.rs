//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication,
//! HTTP, pagination and long-running operation polling.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

/// Default interval between operation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Base URLs of the REST APIs the sweeper talks to
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub compute: String,
    pub storage: String,
    pub iam: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: "https://compute.googleapis.com/compute/v1".to_string(),
            storage: "https://storage.googleapis.com/storage/v1".to_string(),
            iam: "https://iam.googleapis.com/v1".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every API at one base URL (used against mock servers)
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            compute: format!("{}/compute/v1", base),
            storage: format!("{}/storage/v1", base),
            iam: format!("{}/v1", base),
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub endpoints: Endpoints,
    pub poll_interval: Duration,
}

/// Terminal state of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Done,
    Failed(String),
    Running,
}

impl GcpClient {
    pub fn new(credentials: GcpCredentials, endpoints: Endpoints) -> Result<Self> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new()?,
            endpoints,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let token = self.credentials.get_token().await?;
        self.http.get(url, &token, query).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str) -> Result<Value> {
        let token = self.credentials.get_token().await?;
        self.http.post(url, &token).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str) -> Result<Value> {
        let token = self.credentials.get_token().await?;
        self.http.delete(url, &token).await
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Fetch every page of a list call, collecting the array under `items_field`
    pub async fn get_all_pages(&self, url: &str, items_field: &str) -> Result<Vec<Value>> {
        self.get_all_pages_with(url, items_field, &[]).await
    }

    /// Same as [`get_all_pages`](Self::get_all_pages) with extra query parameters
    pub async fn get_all_pages_with(
        &self,
        url: &str,
        items_field: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let (items, next) = self
                .get_page(url, items_field, query, page_token.as_deref())
                .await?;
            all_items.extend(items);

            page_token = next;
            if page_token.is_none() {
                break;
            }
        }

        Ok(all_items)
    }

    /// Fetch a single page; returns its items and the token of the next page
    pub async fn get_page(
        &self,
        url: &str,
        items_field: &str,
        query: &[(&str, &str)],
        page_token: Option<&str>,
    ) -> Result<(Vec<Value>, Option<String>)> {
        let mut params: Vec<(&str, &str)> = query.to_vec();
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self.get(url, &params).await?;
        let items = response
            .get(items_field)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        Ok((items, next_page_token(&response)))
    }

    /// Fetch every page of a Compute Engine aggregated list and flatten it
    pub async fn get_aggregated(&self, url: &str) -> Result<Vec<Value>> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = match page_token.as_deref() {
                Some(token) => self.get(url, &[("pageToken", token)]).await?,
                None => self.get(url, &[]).await?,
            };
            all_items.extend(flatten_aggregated_response(&response));

            page_token = next_page_token(&response);
            if page_token.is_none() {
                break;
            }
        }

        Ok(all_items)
    }

    // =========================================================================
    // Long-running operations
    // =========================================================================

    /// Poll a Compute Engine operation until it is DONE
    ///
    /// Uses the operation's `wait` method, which itself blocks server-side
    /// for up to two minutes. There is no overall timeout.
    pub async fn wait_for_operation(&self, operation: &Value) -> Result<()> {
        let mut current = operation.clone();

        loop {
            match operation_status(&current) {
                OperationStatus::Done => return Ok(()),
                OperationStatus::Failed(message) => {
                    return Err(anyhow::anyhow!("operation failed: {}", message));
                },
                OperationStatus::Running => {},
            }

            let self_link = current
                .get("selfLink")
                .and_then(|v| v.as_str())
                .context("Operation has no selfLink to poll")?
                .to_string();

            tokio::time::sleep(self.poll_interval).await;
            current = self
                .post(&format!("{}/wait", self_link))
                .await
                .context("Failed to poll operation")?;
        }
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, project: &str, path: &str) -> String {
        format!("{}/projects/{}/{}", self.endpoints.compute, project, path)
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, project: &str, zone: &str, resource: &str) -> String {
        self.compute_url(project, &format!("zones/{}/{}", zone, resource))
    }

    /// Build regional Compute Engine API URL
    pub fn compute_regional_url(&self, project: &str, region: &str, resource: &str) -> String {
        self.compute_url(project, &format!("regions/{}/{}", region, resource))
    }

    /// Build global Compute Engine API URL
    pub fn compute_global_url(&self, project: &str, resource: &str) -> String {
        self.compute_url(project, &format!("global/{}", resource))
    }

    /// Build aggregated Compute Engine API URL (all zones / regions)
    pub fn compute_aggregated_url(&self, project: &str, resource: &str) -> String {
        self.compute_url(project, &format!("aggregated/{}", resource))
    }

    // =========================================================================
    // Cloud Storage API helpers
    // =========================================================================

    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.storage, path)
    }

    pub fn storage_bucket_url(&self, bucket: &str) -> String {
        self.storage_url(&format!("b/{}", urlencoding::encode(bucket)))
    }

    pub fn storage_objects_url(&self, bucket: &str) -> String {
        self.storage_url(&format!("b/{}/o", urlencoding::encode(bucket)))
    }

    pub fn storage_object_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/{}",
            self.storage_objects_url(bucket),
            urlencoding::encode(object)
        )
    }

    // =========================================================================
    // IAM API helpers
    // =========================================================================

    /// Build IAM URL for a resource path such as `projects/p/serviceAccounts`
    pub fn iam_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.iam, path)
    }
}

fn next_page_token(response: &Value) -> Option<String> {
    response
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Flatten an aggregated API response into a flat list of resources.
/// Aggregated responses have format: { "items": { "zones/us-central1-a": { "instances": [...] }, ... } }
pub fn flatten_aggregated_response(response: &Value) -> Vec<Value> {
    let Some(items) = response.get("items").and_then(|v| v.as_object()) else {
        return Vec::new();
    };

    let mut all_items: Vec<Value> = Vec::new();

    for (_scope_key, scope_data) in items {
        if let Some(obj) = scope_data.as_object() {
            for (key, value) in obj {
                // Scopes without resources only carry a warning
                if key == "warning" {
                    continue;
                }
                if let Some(arr) = value.as_array() {
                    all_items.extend(arr.iter().cloned());
                }
            }
        }
    }

    all_items
}

/// Read the status of a Compute Engine operation resource
pub fn operation_status(operation: &Value) -> OperationStatus {
    let status = operation
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("DONE");

    if status != "DONE" {
        return OperationStatus::Running;
    }

    let errors: Vec<String> = operation
        .get("error")
        .and_then(|e| e.get("errors"))
        .and_then(|e| e.as_array())
        .map(|arr| {
            arr.iter()
                .map(|err| {
                    let code = err.get("code").and_then(|c| c.as_str()).unwrap_or("UNKNOWN");
                    let message = err.get("message").and_then(|m| m.as_str()).unwrap_or("");
                    format!("{}: {}", code, message)
                })
                .collect()
        })
        .unwrap_or_default();

    if errors.is_empty() {
        OperationStatus::Done
    } else {
        OperationStatus::Failed(errors.join("; "))
    }
}
