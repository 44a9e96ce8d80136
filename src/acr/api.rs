//! Collaborator seams of the registry commands
//!
//! Commands never reach for a global client. They receive a [`Services`]
//! handle whose parts are these traits, implemented over REST by
//! [`crate::azure::client::AzureClient`] and by fakes in tests.

use super::models::{
    NameAvailability, Registry, RegistryDeployment, RegistryUpdateParameters,
};
use anyhow::Result;
use async_trait::async_trait;

/// Registry management operations of the remote service
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn check_name_availability(&self, registry_name: &str) -> Result<NameAvailability>;

    async fn list(&self) -> Result<Vec<Registry>>;

    async fn list_by_resource_group(&self, resource_group: &str) -> Result<Vec<Registry>>;

    async fn get_properties(&self, resource_group: &str, registry_name: &str) -> Result<Registry>;

    async fn create_or_update(
        &self,
        resource_group: &str,
        registry_name: &str,
        registry: &Registry,
    ) -> Result<Registry>;

    async fn update(
        &self,
        resource_group: &str,
        registry_name: &str,
        parameters: &RegistryUpdateParameters,
    ) -> Result<Registry>;

    async fn delete(&self, resource_group: &str, registry_name: &str) -> Result<()>;
}

/// Lookups used to fill in identifiers the caller left out
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// First access key of a storage account in the subscription
    async fn storage_account_key(&self, storage_account_name: &str) -> Result<String>;

    /// Resource group holding the named registry
    async fn resource_group_by_registry_name(&self, registry_name: &str) -> Result<String>;
}

/// Template deployment creating a registry together with a new storage account
#[async_trait]
pub trait TemplateDeployer: Send + Sync {
    /// Deploy and wait until the deployment has finished
    async fn deploy_registry(&self, deployment: &RegistryDeployment) -> Result<()>;
}

/// Handle passed to every command
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub registries: &'a dyn RegistryClient,
    pub lookup: &'a dyn ResourceLookup,
    pub deployer: &'a dyn TemplateDeployer,
}

impl<'a> Services<'a> {
    /// Use one value for all collaborators
    pub fn from_client<T>(client: &'a T) -> Self
    where
        T: RegistryClient + ResourceLookup + TemplateDeployer,
    {
        Self {
            registries: client,
            lookup: client,
            deployer: client,
        }
    }
}
