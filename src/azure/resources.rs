//! Supporting lookups and template deployments
//!
//! Storage account keys, resource group discovery for a registry name, and
//! the template deployment that creates a registry with a new storage account.

use super::client::{with_api_version, AzureClient};
use crate::acr::api::{RegistryClient, ResourceLookup, TemplateDeployer};
use crate::acr::models::RegistryDeployment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

pub const STORAGE_API_VERSION: &str = "2016-01-01";
pub const DEPLOYMENT_API_VERSION: &str = "2016-09-01";

/// ARM template creating a registry and its storage account (compiled into the binary)
const REGISTRY_TEMPLATE: &str = include_str!("templates/registry.json");

impl AzureClient {
    pub fn storage_accounts_url(&self) -> String {
        with_api_version(
            &self.subscription_url("providers/Microsoft.Storage/storageAccounts"),
            STORAGE_API_VERSION,
        )
    }

    pub fn deployment_url(&self, resource_group: &str, deployment_name: &str) -> String {
        let url = self.resource_group_url(
            resource_group,
            &format!(
                "providers/Microsoft.Resources/deployments/{}",
                urlencoding::encode(deployment_name)
            ),
        );
        with_api_version(&url, DEPLOYMENT_API_VERSION)
    }
}

/// `acr_{registry}_{UTC timestamp}`
fn deployment_name(registry_name: &str) -> String {
    format!(
        "acr_{}_{}",
        registry_name,
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    )
}

/// Request body of the registry template deployment
pub fn deployment_body(deployment: &RegistryDeployment) -> Result<Value> {
    let template: Value =
        serde_json::from_str(REGISTRY_TEMPLATE).context("Failed to parse registry template")?;

    Ok(json!({
        "properties": {
            "mode": "Incremental",
            "template": template,
            "parameters": {
                "registryName": { "value": deployment.registry_name },
                "registryLocation": { "value": deployment.location },
                "storageAccountName": { "value": deployment.storage_account_name },
                "adminUserEnabled": { "value": deployment.admin_user_enabled }
            }
        }
    }))
}

fn name_matches(value: &Value, name: &str) -> bool {
    value
        .get("name")
        .and_then(|n| n.as_str())
        .map(|n| n.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

#[async_trait]
impl ResourceLookup for AzureClient {
    async fn storage_account_key(&self, storage_account_name: &str) -> Result<String> {
        let accounts = self.get_all(&self.storage_accounts_url()).await?;
        let account_id = accounts
            .iter()
            .find(|a| name_matches(a, storage_account_name))
            .and_then(|a| a.get("id"))
            .and_then(|id| id.as_str())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No storage account named '{}' found in subscription {}",
                    storage_account_name,
                    self.subscription_id
                )
            })?;

        let url = with_api_version(
            &format!("{}/listKeys", self.resource_id_url(account_id)),
            STORAGE_API_VERSION,
        );
        let keys = self.post(&url, None).await?;

        keys.get("keys")
            .and_then(|k| k.as_array())
            .and_then(|k| k.first())
            .and_then(|k| k.get("value"))
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Storage account '{}' returned no access keys",
                    storage_account_name
                )
            })
    }

    async fn resource_group_by_registry_name(&self, registry_name: &str) -> Result<String> {
        let registries = self.list().await?;
        registries
            .iter()
            .find(|r| {
                r.name
                    .as_deref()
                    .map(|n| n.eq_ignore_ascii_case(registry_name))
                    .unwrap_or(false)
            })
            .and_then(|r| r.resource_group())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No container registry named '{}' found in subscription {}",
                    registry_name,
                    self.subscription_id
                )
            })
    }
}

#[async_trait]
impl TemplateDeployer for AzureClient {
    async fn deploy_registry(&self, deployment: &RegistryDeployment) -> Result<()> {
        let name = deployment_name(&deployment.registry_name);
        let url = self.deployment_url(&deployment.resource_group, &name);
        tracing::info!("Starting deployment {} in {}", name, deployment.resource_group);

        let result = self.put(&url, &deployment_body(deployment)?).await?;

        let state = result
            .get("properties")
            .and_then(|p| p.get("provisioningState"))
            .and_then(|s| s.as_str())
            .unwrap_or("Succeeded");
        if state != "Succeeded" {
            return Err(anyhow::anyhow!(
                "Deployment {} finished in state {}",
                name,
                state
            ));
        }

        tracing::info!("Deployment {} succeeded", name);
        Ok(())
    }
}
