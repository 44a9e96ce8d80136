//! Azure Resource Manager interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from the environment or the Azure CLI
//! - [`client`] - Subscription-scoped client and URL builders
//! - [`http`] - HTTP utilities for REST calls
//! - [`lro`] - Long-running operation polling
//! - [`registries`] - Container registry operations
//! - [`resources`] - Storage key and resource group lookups, template deployments
//!
//! # Example
//!
//! ```ignore
//! use acrctl::acr::{commands, Services};
//! use acrctl::azure::client::{AzureClient, DEFAULT_ENDPOINT};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = AzureClient::new("00000000-0000-0000-0000-000000000000", DEFAULT_ENDPOINT)?;
//!     let registries = commands::list(Services::from_client(&client), None).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod lro;
pub mod registries;
pub mod resources;
