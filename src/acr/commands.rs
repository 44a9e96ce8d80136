//! Registry commands
//!
//! One function per CLI verb. Each resolves what the caller left out, builds
//! the request and hands it to the collaborators in [`Services`]. Errors from
//! the collaborators are returned unchanged.

use super::api::Services;
use super::models::{NameAvailability, Registry, RegistryDeployment, RegistryUpdateParameters, StorageAccountProperties};
use super::update::{Patch, RegistryUpdate};
use anyhow::Result;

/// Length of generated storage account names
pub const STORAGE_ACCOUNT_NAME_LENGTH: usize = 24;

/// Arguments of `acr create`
#[derive(Debug, Clone, Default)]
pub struct CreateRegistry {
    pub registry_name: String,
    pub resource_group: String,
    pub location: String,
    pub storage_account_name: Option<String>,
    pub admin_enabled: bool,
}

/// Random lowercase alphanumeric storage account name
pub fn generate_storage_account_name() -> String {
    let mut name = uuid::Uuid::new_v4().simple().to_string();
    name.truncate(STORAGE_ACCOUNT_NAME_LENGTH);
    name
}

async fn resolve_resource_group(
    services: Services<'_>,
    registry_name: &str,
    resource_group: Option<&str>,
) -> Result<String> {
    match resource_group {
        Some(rg) => Ok(rg.to_string()),
        None => {
            tracing::debug!("Looking up resource group of registry {}", registry_name);
            services.lookup.resource_group_by_registry_name(registry_name).await
        }
    }
}

/// Check whether a registry name is available
pub async fn check_name(services: Services<'_>, registry_name: &str) -> Result<NameAvailability> {
    tracing::info!("acr check-name: {}", registry_name);
    services.registries.check_name_availability(registry_name).await
}

/// List registries in the subscription or in one resource group
pub async fn list(services: Services<'_>, resource_group: Option<&str>) -> Result<Vec<Registry>> {
    tracing::info!("acr list: resource_group={:?}", resource_group);
    match resource_group {
        Some(rg) => services.registries.list_by_resource_group(rg).await,
        None => services.registries.list().await,
    }
}

/// Create a registry
///
/// Without a storage account name a fresh account is created alongside the
/// registry by a template deployment; otherwise the existing account's key
/// is looked up and the registry is created directly.
pub async fn create(services: Services<'_>, args: CreateRegistry) -> Result<Registry> {
    tracing::info!(
        "acr create: name={}, resource_group={}, location={}",
        args.registry_name,
        args.resource_group,
        args.location
    );

    match args.storage_account_name {
        None => {
            let deployment = RegistryDeployment {
                resource_group: args.resource_group.clone(),
                registry_name: args.registry_name.clone(),
                location: args.location.clone(),
                storage_account_name: generate_storage_account_name(),
                admin_user_enabled: args.admin_enabled,
            };
            tracing::info!(
                "Deploying registry with new storage account {}",
                deployment.storage_account_name
            );
            services.deployer.deploy_registry(&deployment).await?;
            services
                .registries
                .get_properties(&args.resource_group, &args.registry_name)
                .await
        }
        Some(storage_account_name) => {
            let key = services.lookup.storage_account_key(&storage_account_name).await?;
            let registry = Registry::new(
                &args.location,
                StorageAccountProperties::new(&storage_account_name, &key),
                args.admin_enabled,
            );
            services
                .registries
                .create_or_update(&args.resource_group, &args.registry_name, &registry)
                .await
        }
    }
}

/// Follow-up instructions printed after a successful create
pub fn service_principal_guidance(registry: &Registry) -> Vec<String> {
    let scope = registry.id.as_deref().unwrap_or("<registry-id>");
    vec![
        String::new(),
        "Create a new service principal and assign access:".to_string(),
        format!(
            "  az ad sp create-for-rbac --scopes {} --role Owner --password <password>",
            scope
        ),
        String::new(),
        "Use an existing service principal and assign access:".to_string(),
        format!(
            "  az role assignment create --scope {} --role Owner --assignee <app-id>",
            scope
        ),
    ]
}

/// Delete a registry
pub async fn delete(services: Services<'_>, registry_name: &str, resource_group: Option<&str>) -> Result<()> {
    let resource_group = resolve_resource_group(services, registry_name, resource_group).await?;
    tracing::info!("acr delete: {}/{}", resource_group, registry_name);
    services.registries.delete(&resource_group, registry_name).await
}

/// Show a registry
pub async fn show(services: Services<'_>, registry_name: &str, resource_group: Option<&str>) -> Result<Registry> {
    let resource_group = resolve_resource_group(services, registry_name, resource_group).await?;
    tracing::info!("acr show: {}/{}", resource_group, registry_name);
    services.registries.get_properties(&resource_group, registry_name).await
}

/// Update a registry with only the fields in `changes`
pub async fn update(
    services: Services<'_>,
    registry_name: &str,
    resource_group: Option<&str>,
    changes: RegistryUpdate,
) -> Result<Registry> {
    let resource_group = resolve_resource_group(services, registry_name, resource_group).await?;
    tracing::info!("acr update: {}/{}", resource_group, registry_name);

    let current = services
        .registries
        .get_properties(&resource_group, registry_name)
        .await?;
    let snapshot = RegistryUpdateParameters::from_registry(&current);
    let parameters = changes.resolve(services.lookup).await?.apply(snapshot);

    services
        .registries
        .update(&resource_group, registry_name, &parameters)
        .await
}
