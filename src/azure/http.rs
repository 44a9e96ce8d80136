//! HTTP utilities for Azure Resource Manager REST calls

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A response that has passed the status check
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ArmResponse {
    /// Read a header as a string, if present and valid
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// HTTP client wrapper for Resource Manager calls
#[derive(Clone)]
pub struct AzureHttpClient {
    client: Client,
}

impl AzureHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("acrctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Send a request and return the decoded response
    ///
    /// Non-success statuses become errors carrying the status and the ARM
    /// error code and message when the body has them. Empty bodies decode to
    /// `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<ArmResponse> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(api_error(status, &text));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).context("Failed to parse response JSON")?
        };

        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }
}

/// Build the error for a failed call from the ARM error envelope
fn api_error(status: StatusCode, body: &str) -> anyhow::Error {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        let error = v.get("error")?;
        let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("Unknown");
        let message = error.get("message").and_then(|m| m.as_str()).unwrap_or("");
        Some(format!("{}: {}", code, message))
    });

    match detail {
        Some(detail) => anyhow::anyhow!("{}{} ({})", API_ERROR_PREFIX, status, detail),
        None => anyhow::anyhow!("{}{}", API_ERROR_PREFIX, status),
    }
}

const API_ERROR_PREFIX: &str = "API request failed: ";

/// HTTP status of the first API failure in the error chain
fn api_status(error: &anyhow::Error) -> Option<u16> {
    error.chain().find_map(|cause| {
        let message = cause.to_string();
        let rest = message.strip_prefix(API_ERROR_PREFIX)?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

/// Format an Azure API error for display, with a hint for common statuses
pub fn format_azure_error(error: &anyhow::Error) -> String {
    let error_str = format!("{:#}", error);

    let hint = match api_status(error) {
        Some(401) => Some("Authentication failed. Run 'az login' or refresh AZURE_ACCESS_TOKEN."),
        Some(403) => Some("Permission denied. Check your role assignments on the subscription."),
        Some(404) => Some("Resource not found."),
        Some(409) => Some("Resource conflict. The resource may already exist or be in use."),
        Some(429) => Some("Rate limit exceeded. Please try again later."),
        _ => None,
    };

    match hint {
        Some(hint) => format!("{}\n{}", error_str, hint),
        None => error_str,
    }
}
