//! Container registry commands
//!
//! # Module Structure
//!
//! - [`api`] - Collaborator traits and the [`Services`] handle
//! - [`commands`] - One function per `acr` verb
//! - [`models`] - Registry request/response shapes
//! - [`update`] - Partial updates merged onto a fetched registry

pub mod api;
pub mod commands;
pub mod models;
pub mod update;

pub use api::{RegistryClient, ResourceLookup, Services, TemplateDeployer};
pub use commands::CreateRegistry;
pub use models::{NameAvailability, Registry, RegistryUpdateParameters, StorageAccountProperties, Tags};
pub use update::RegistryUpdate;
