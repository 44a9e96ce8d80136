//! Read-modify-write support for `acr update`
//!
//! The update command fetches the registry, projects it onto
//! [`RegistryUpdateParameters`], merges a [`Patch`] holding only what the
//! caller supplied, and submits the result.

use super::api::ResourceLookup;
use super::models::{RegistryUpdateParameters, StorageAccountProperties, Tags};
use anyhow::Result;

/// A partial change merged onto a fetched snapshot
pub trait Patch<T> {
    /// Overwrite the fields this patch carries, keep everything else
    fn apply(self, target: T) -> T;
}

/// Admin flag as typed on the command line: only `"true"` enables it
pub fn parse_admin_flag(value: &str) -> bool {
    value == "true"
}

/// Changes requested by the caller, before any lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryUpdate {
    pub admin_user_enabled: Option<String>,
    pub storage_account_name: Option<String>,
    pub tags: Option<Tags>,
}

impl RegistryUpdate {
    pub fn is_empty(&self) -> bool {
        self.admin_user_enabled.is_none() && self.storage_account_name.is_none() && self.tags.is_none()
    }

    /// Resolve the storage account key (if a storage account was given)
    pub async fn resolve(self, lookup: &dyn ResourceLookup) -> Result<RegistryPatch> {
        let storage_account = match self.storage_account_name {
            Some(name) => {
                let key = lookup.storage_account_key(&name).await?;
                Some(StorageAccountProperties::new(&name, &key))
            }
            None => None,
        };

        Ok(RegistryPatch {
            admin_user_enabled: self.admin_user_enabled.as_deref().map(parse_admin_flag),
            storage_account,
            tags: self.tags,
        })
    }
}

/// Fully resolved registry changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryPatch {
    pub admin_user_enabled: Option<bool>,
    pub storage_account: Option<StorageAccountProperties>,
    pub tags: Option<Tags>,
}

impl Patch<RegistryUpdateParameters> for RegistryPatch {
    fn apply(self, mut target: RegistryUpdateParameters) -> RegistryUpdateParameters {
        if let Some(enabled) = self.admin_user_enabled {
            target.admin_user_enabled = Some(enabled);
        }
        if let Some(storage) = self.storage_account {
            target.storage_account = Some(storage);
        }
        if let Some(tags) = self.tags {
            target.tags = Some(tags);
        }
        target
    }
}
