//! Long-running operations
//!
//! Resource Manager answers slow mutations with `201`/`202` and a URL to
//! poll: `Azure-AsyncOperation` (an operation status document) or
//! `Location` (answers `202` until the operation is done).

use super::client::AzureClient;
use super::http::ArmResponse;
use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const LOCATION_HEADER: &str = "location";
const RETRY_AFTER_HEADER: &str = "retry-after";

/// How long-running operations are polled
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Delay between polls when the service sends no `Retry-After`
    pub interval: Duration,
    /// Upper bound on the whole wait
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Wait for the operation started by `initial` and return its final body
///
/// `resource_url` is re-read once the operation succeeds when the poll
/// response itself does not carry the resource.
pub async fn wait_for_completion(
    client: &AzureClient,
    initial: ArmResponse,
    resource_url: Option<&str>,
) -> Result<Value> {
    if !matches!(initial.status, StatusCode::CREATED | StatusCode::ACCEPTED) {
        return Ok(initial.body);
    }

    let settings = client.poll;
    tokio::time::timeout(settings.timeout, poll(client, initial, resource_url))
        .await
        .with_context(|| {
            format!(
                "Long-running operation did not finish within {} seconds",
                settings.timeout.as_secs()
            )
        })?
}

async fn poll(client: &AzureClient, initial: ArmResponse, resource_url: Option<&str>) -> Result<Value> {
    if let Some(operation_url) = initial.header(ASYNC_OPERATION_HEADER).map(str::to_string) {
        tracing::debug!("Polling async operation {}", operation_url);
        let mut delay = retry_after(&initial).unwrap_or(client.poll.interval);

        loop {
            tokio::time::sleep(delay).await;
            let response = client.send(Method::GET, &operation_url, None).await?;
            let status = response
                .body
                .get("status")
                .and_then(|s| s.as_str())
                .unwrap_or("InProgress")
                .to_string();

            match status.as_str() {
                "Succeeded" => break,
                "Failed" | "Canceled" => return Err(operation_failed(&status, &response.body)),
                _ => delay = retry_after(&response).unwrap_or(client.poll.interval),
            }
        }

        return match resource_url {
            Some(url) => client.get(url).await,
            None => Ok(initial.body),
        };
    }

    if let Some(location) = initial.header(LOCATION_HEADER).map(str::to_string) {
        tracing::debug!("Polling location {}", location);
        let mut delay = retry_after(&initial).unwrap_or(client.poll.interval);

        loop {
            tokio::time::sleep(delay).await;
            let response = client.send(Method::GET, &location, None).await?;
            if response.status != StatusCode::ACCEPTED {
                if response.body.is_null() {
                    if let Some(url) = resource_url {
                        return client.get(url).await;
                    }
                }
                return Ok(response.body);
            }
            delay = retry_after(&response).unwrap_or(client.poll.interval);
        }
    }

    Ok(initial.body)
}

fn retry_after(response: &ArmResponse) -> Option<Duration> {
    response
        .header(RETRY_AFTER_HEADER)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn operation_failed(status: &str, body: &Value) -> anyhow::Error {
    let message = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("no error detail returned");
    anyhow::anyhow!("Long-running operation {}: {}", status.to_lowercase(), message)
}
