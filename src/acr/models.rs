//! Container registry request and response shapes
//!
//! These mirror the Resource Manager JSON for
//! `Microsoft.ContainerRegistry/registries`. They are never stored locally.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Resource tags
pub type Tags = BTreeMap<String, String>;

/// Storage account backing a registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    pub name: String,
    /// Only sent on writes; reads do not return it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
}

impl StorageAccountProperties {
    pub fn new(name: &str, access_key: &str) -> Self {
        Self {
            name: name.to_string(),
            access_key: Some(access_key.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub admin_user_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_account: Option<StorageAccountProperties>,
}

/// A container registry resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(default)]
    pub properties: RegistryProperties,
}

impl Registry {
    /// Body for a create-or-update PUT
    pub fn new(location: &str, storage_account: StorageAccountProperties, admin_user_enabled: bool) -> Self {
        Self {
            location: location.to_string(),
            properties: RegistryProperties {
                admin_user_enabled,
                storage_account: Some(storage_account),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Resource group parsed from the resource id
    pub fn resource_group(&self) -> Option<String> {
        self.id
            .as_deref()
            .and_then(crate::azure::client::resource_group_from_id)
    }
}

/// PATCH body for a registry update
///
/// Every field is optional; only the ones present are sent. A storage
/// account without an access key is left out, which keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryUpdateParameters {
    pub tags: Option<Tags>,
    pub admin_user_enabled: Option<bool>,
    pub storage_account: Option<StorageAccountProperties>,
}

impl RegistryUpdateParameters {
    /// Snapshot of the updatable fields of a fetched registry
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            tags: registry.tags.clone(),
            admin_user_enabled: Some(registry.properties.admin_user_enabled),
            storage_account: registry.properties.storage_account.clone(),
        }
    }

    pub fn to_request_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(tags) = &self.tags {
            body.insert("tags".to_string(), json!(tags));
        }

        let mut properties = Map::new();
        if let Some(enabled) = self.admin_user_enabled {
            properties.insert("adminUserEnabled".to_string(), Value::Bool(enabled));
        }
        // The service requires name and key together; a fetched account has no key
        if let Some(storage) = self.storage_account.as_ref().filter(|s| s.access_key.is_some()) {
            properties.insert("storageAccount".to_string(), json!(storage));
        }
        if !properties.is_empty() {
            body.insert("properties".to_string(), Value::Object(properties));
        }

        Value::Object(body)
    }
}

/// Result of a registry name check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAvailability {
    pub name_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Inputs of a template deployment creating a registry and its storage account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDeployment {
    pub resource_group: String,
    pub registry_name: String,
    pub location: String,
    pub storage_account_name: String,
    pub admin_user_enabled: bool,
}
