//! Azure Authentication
//!
//! Handles bearer tokens for the Resource Manager API, taken either from the
//! `AZURE_ACCESS_TOKEN` environment variable or from the Azure CLI login via
//! `azure_identity`.

use anyhow::{Context, Result};
use azure_core::credentials::TokenCredential;
use azure_identity::AzureCliCredential;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Environment variable holding a pre-acquired access token
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if the issued token carries no usable expiry
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Clone)]
enum TokenSource {
    /// Fixed token (environment or tests), never refreshed
    Static(String),
    /// Credential chain from `azure_identity`
    Provider(Arc<dyn TokenCredential>),
}

/// Azure credentials holder with token caching
#[derive(Clone)]
pub struct AzureCredentials {
    source: TokenSource,
    scope: String,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// OAuth scope for a Resource Manager endpoint
pub fn management_scope(endpoint: &str) -> String {
    format!("{}/.default", endpoint.trim_end_matches('/'))
}

impl AzureCredentials {
    /// Use `AZURE_ACCESS_TOKEN` when set, otherwise the Azure CLI login
    pub fn new(endpoint: &str) -> Result<Self> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                return Ok(Self::from_static_token(token.trim()));
            }
        }

        let credential = AzureCliCredential::new(None).context(
            "Failed to initialize Azure authentication. Run 'az login' or set AZURE_ACCESS_TOKEN",
        )?;

        Ok(Self::from_provider(credential, endpoint))
    }

    /// Credentials backed by any `azure_identity` credential
    pub fn from_provider(provider: Arc<dyn TokenCredential>, endpoint: &str) -> Self {
        Self {
            source: TokenSource::Provider(provider),
            scope: management_scope(endpoint),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Credentials that always hand out the same token
    pub fn from_static_token(token: &str) -> Self {
        Self {
            source: TokenSource::Static(token.to_string()),
            scope: String::new(),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        let provider = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Provider(provider) => provider,
        };

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let access = provider
            .get_token(&[self.scope.as_str()], None)
            .await
            .context("Failed to get access token. Run 'az login' or set AZURE_ACCESS_TOKEN")?;

        let token = access.token.secret().to_string();
        let ttl = token_ttl(access.expires_on.unix_timestamp(), chrono::Utc::now().timestamp())
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }
}

/// Remaining lifetime of a token expiring at `expires_on` (Unix seconds)
fn token_ttl(expires_on: i64, now: i64) -> Option<Duration> {
    u64::try_from(expires_on - now).ok().map(Duration::from_secs)
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Subscription ids are GUIDs
pub fn validate_subscription_id(subscription: &str) -> bool {
    uuid::Uuid::parse_str(subscription).is_ok()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Read the default subscription from the environment or the Azure CLI profile
pub fn get_default_subscription() -> Option<String> {
    if let Ok(subscription) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&subscription) {
            return Some(subscription);
        }
        tracing::warn!("Invalid subscription id format in AZURE_SUBSCRIPTION_ID");
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(&profile_path).ok()?;

    default_subscription_from_profile(&content)
}

fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The CLI writes this file with a byte order mark
    let content = content.trim_start_matches('\u{feff}');
    let profile: AzureProfile = match serde_json::from_str(content) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Failed to parse azureProfile.json: {}", e);
            return None;
        }
    };

    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default && validate_subscription_id(&s.id))
        .map(|s| s.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_is_returned_as_is() {
        let credentials = AzureCredentials::from_static_token("abc");
        assert_eq!(credentials.get_token().await.unwrap(), "abc");
        assert_eq!(credentials.refresh_token().await.unwrap(), "abc");
    }

    #[test]
    fn test_default_subscription_from_profile() {
        let profile = "\u{feff}{\"subscriptions\": [\
            {\"id\": \"00000000-0000-0000-0000-000000000001\", \"isDefault\": false},\
            {\"id\": \"00000000-0000-0000-0000-000000000002\", \"isDefault\": true}\
        ]}";
        assert_eq!(
            default_subscription_from_profile(profile).as_deref(),
            Some("00000000-0000-0000-0000-000000000002")
        );
    }

    #[test]
    fn test_profile_without_default_subscription() {
        let profile = r#"{"subscriptions": [{"id": "not-a-guid", "isDefault": true}]}"#;
        assert!(default_subscription_from_profile(profile).is_none());
        assert!(default_subscription_from_profile("garbage").is_none());
    }

    #[test]
    fn test_token_ttl() {
        assert_eq!(token_ttl(1_000 + 3_600, 1_000), Some(Duration::from_secs(3_600)));
        assert_eq!(token_ttl(1_000, 1_000), Some(Duration::ZERO));
        assert!(token_ttl(999, 1_000).is_none());
    }

    #[test]
    fn test_management_scope() {
        assert_eq!(
            management_scope("https://management.azure.com/"),
            "https://management.azure.com/.default"
        );
        assert_eq!(
            management_scope("https://management.chinacloudapi.cn"),
            "https://management.chinacloudapi.cn/.default"
        );
    }
}
