//! Container registry REST operations
//!
//! `Microsoft.ContainerRegistry/registries` on top of [`AzureClient`].

use super::client::{with_api_version, AzureClient};
use crate::acr::api::RegistryClient;
use crate::acr::models::{NameAvailability, Registry, RegistryUpdateParameters};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

pub const REGISTRY_API_VERSION: &str = "2016-06-27-preview";

const PROVIDER: &str = "providers/Microsoft.ContainerRegistry";
const RESOURCE_TYPE: &str = "Microsoft.ContainerRegistry/registries";

impl AzureClient {
    /// URL of one registry
    pub fn registry_url(&self, resource_group: &str, registry_name: &str) -> String {
        let url = self.resource_group_url(
            resource_group,
            &format!("{}/registries/{}", PROVIDER, urlencoding::encode(registry_name)),
        );
        with_api_version(&url, REGISTRY_API_VERSION)
    }

    /// URL of the registry collection, subscription-wide or in one group
    pub fn registries_url(&self, resource_group: Option<&str>) -> String {
        let path = format!("{}/registries", PROVIDER);
        let url = match resource_group {
            Some(rg) => self.resource_group_url(rg, &path),
            None => self.subscription_url(&path),
        };
        with_api_version(&url, REGISTRY_API_VERSION)
    }
}

fn parse_registry(value: Value) -> Result<Registry> {
    serde_json::from_value(value).context("Failed to parse registry")
}

fn parse_registries(values: Vec<Value>) -> Result<Vec<Registry>> {
    values.into_iter().map(parse_registry).collect()
}

#[async_trait]
impl RegistryClient for AzureClient {
    async fn check_name_availability(&self, registry_name: &str) -> Result<NameAvailability> {
        let url = with_api_version(
            &self.subscription_url(&format!("{}/checkNameAvailability", PROVIDER)),
            REGISTRY_API_VERSION,
        );
        let body = json!({ "name": registry_name, "type": RESOURCE_TYPE });
        let response = self.post(&url, Some(&body)).await?;
        serde_json::from_value(response).context("Failed to parse name availability")
    }

    async fn list(&self) -> Result<Vec<Registry>> {
        parse_registries(self.get_all(&self.registries_url(None)).await?)
    }

    async fn list_by_resource_group(&self, resource_group: &str) -> Result<Vec<Registry>> {
        parse_registries(self.get_all(&self.registries_url(Some(resource_group))).await?)
    }

    async fn get_properties(&self, resource_group: &str, registry_name: &str) -> Result<Registry> {
        parse_registry(self.get(&self.registry_url(resource_group, registry_name)).await?)
    }

    async fn create_or_update(
        &self,
        resource_group: &str,
        registry_name: &str,
        registry: &Registry,
    ) -> Result<Registry> {
        let body = serde_json::to_value(registry).context("Failed to serialize registry")?;
        parse_registry(
            self.put(&self.registry_url(resource_group, registry_name), &body)
                .await?,
        )
    }

    async fn update(
        &self,
        resource_group: &str,
        registry_name: &str,
        parameters: &RegistryUpdateParameters,
    ) -> Result<Registry> {
        let body = parameters.to_request_body();
        parse_registry(
            self.patch(&self.registry_url(resource_group, registry_name), &body)
                .await?,
        )
    }

    async fn delete(&self, resource_group: &str, registry_name: &str) -> Result<()> {
        AzureClient::delete(self, &self.registry_url(resource_group, registry_name)).await?;
        Ok(())
    }
}
