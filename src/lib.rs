//! acrctl - Azure container registry management from the command line
//!
//! - [`acr`] - Registry commands and the collaborator traits they run against
//! - [`azure`] - Resource Manager client implementing those traits over REST
//! - [`fixture`] - Recorded HTTP fixtures and long-running-operation shrinking
//! - [`output`] - JSON, table and TSV rendering
//! - [`config`] - Persisted defaults
//! - [`cli`] - Command tree and dispatch

pub mod acr;
pub mod azure;
pub mod cli;
pub mod config;
pub mod fixture;
pub mod output;

/// Version injected at compile time via ACRCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ACRCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};
