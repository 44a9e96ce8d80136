//! Azure Client
//!
//! Main client for Resource Manager calls, combining authentication, HTTP
//! and long-running-operation handling for one subscription.

use super::auth::AzureCredentials;
use super::http::{ArmResponse, AzureHttpClient};
use super::lro::{self, PollSettings};
use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::Value;

/// Public cloud Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Main Azure client
#[derive(Clone)]
pub struct AzureClient {
    pub credentials: AzureCredentials,
    pub http: AzureHttpClient,
    pub subscription_id: String,
    pub endpoint: String,
    pub poll: PollSettings,
}

impl AzureClient {
    /// Create a client using credentials from the environment
    pub fn new(subscription_id: &str, endpoint: &str) -> Result<Self> {
        Self::with_credentials(subscription_id, endpoint, AzureCredentials::new(endpoint)?)
    }

    pub fn with_credentials(
        subscription_id: &str,
        endpoint: &str,
        credentials: AzureCredentials,
    ) -> Result<Self> {
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid Resource Manager endpoint: {}", endpoint))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Resource Manager endpoint must be http(s): {}", endpoint);
        }

        Ok(Self {
            credentials,
            http: AzureHttpClient::new()?,
            subscription_id: subscription_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            poll: PollSettings::default(),
        })
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Send one request without any polling
    pub async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<ArmResponse> {
        let token = self.get_token().await?;
        self.http.send(method, url, &token, body).await
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        Ok(self.send(Method::GET, url, None).await?.body)
    }

    /// GET a collection, following `nextLink` until the last page
    pub async fn get_all(&self, url: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next {
            let page = self.get(&page_url).await?;
            if let Some(values) = page.get("value").and_then(|v| v.as_array()) {
                items.extend(values.iter().cloned());
            }
            next = page
                .get("nextLink")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
        }

        Ok(items)
    }

    /// PUT a resource and wait for the operation to finish
    pub async fn put(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.send(Method::PUT, url, Some(body)).await?;
        lro::wait_for_completion(self, response, Some(url)).await
    }

    /// PATCH a resource and wait for the operation to finish
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.send(Method::PATCH, url, Some(body)).await?;
        lro::wait_for_completion(self, response, Some(url)).await
    }

    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let response = self.send(Method::POST, url, body).await?;
        lro::wait_for_completion(self, response, None).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        let response = self.send(Method::DELETE, url, None).await?;
        lro::wait_for_completion(self, response, None).await
    }

    // =========================================================================
    // Resource Manager URL helpers
    // =========================================================================

    /// Build a subscription-scoped URL
    pub fn subscription_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}",
            self.endpoint,
            self.subscription_id,
            path.trim_start_matches('/')
        )
    }

    /// Build a resource-group-scoped URL
    pub fn resource_group_url(&self, resource_group: &str, path: &str) -> String {
        self.subscription_url(&format!(
            "resourceGroups/{}/{}",
            urlencoding::encode(resource_group),
            path.trim_start_matches('/')
        ))
    }

    /// Build a URL from a full resource id returned by the service
    pub fn resource_id_url(&self, resource_id: &str) -> String {
        format!("{}/{}", self.endpoint, resource_id.trim_start_matches('/'))
    }
}

/// Append the `api-version` query parameter
pub fn with_api_version(url: &str, api_version: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}api-version={}", url, separator, api_version)
}

/// Extract the resource group name from a resource id
///
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/...` -> `{rg}`
pub fn resource_group_from_id(resource_id: &str) -> Option<String> {
    let mut parts = resource_id.split('/');
    while let Some(part) = parts.next() {
        if part.eq_ignore_ascii_case("resourceGroups") {
            return parts.next().filter(|rg| !rg.is_empty()).map(|rg| rg.to_string());
        }
    }
    None
}
