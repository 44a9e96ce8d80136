//! Command-line interface
//!
//! The clap command tree and the dispatch of each verb to its command
//! function. `main` only parses, sets up logging, builds the client and
//! prints what comes back.

use crate::acr::commands::{self, CreateRegistry};
use crate::acr::{RegistryUpdate, Services, Tags};
use crate::config::Config;
use crate::fixture;
use crate::output::{CommandOutput, OutputFormat, NAME_AVAILABILITY_COLUMNS, REGISTRY_COLUMNS};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// Manage Azure container registries
#[derive(Parser, Debug)]
#[command(name = "acrctl", version, about, long_about = None)]
pub struct Cli {
    /// Subscription to use
    #[arg(long, global = true)]
    pub subscription: Option<String>,

    /// Resource Manager endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage container registries
    #[command(subcommand)]
    Acr(AcrCommand),

    /// Save defaults to the config file and print the result
    Configure {
        /// Default subscription id
        #[arg(long = "default-subscription")]
        subscription: Option<String>,

        /// Default location for new registries
        #[arg(long)]
        location: Option<String>,

        /// Default output format
        #[arg(long = "default-output", value_enum)]
        output: Option<OutputFormat>,
    },

    /// Work with recorded HTTP fixtures
    #[command(subcommand)]
    Fixture(FixtureCommand),
}

#[derive(Subcommand, Debug)]
pub enum AcrCommand {
    /// Check whether a registry name is available
    CheckName {
        /// Registry name
        #[arg(short, long)]
        name: String,
    },

    /// List registries
    List {
        /// Only list registries of this resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
    },

    /// Create a registry
    Create {
        /// Registry name
        #[arg(short, long)]
        name: String,

        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: String,

        /// Location (defaults to the configured location)
        #[arg(short, long)]
        location: Option<String>,

        /// Existing storage account; a new one is created when omitted
        #[arg(long)]
        storage_account_name: Option<String>,

        /// Enable the admin user
        #[arg(long)]
        admin_enabled: bool,
    },

    /// Delete a registry
    Delete {
        /// Registry name
        #[arg(short, long)]
        name: String,

        /// Resource group (looked up when omitted)
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
    },

    /// Show a registry
    Show {
        /// Registry name
        #[arg(short, long)]
        name: String,

        /// Resource group (looked up when omitted)
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
    },

    /// Update a registry
    Update {
        /// Registry name
        #[arg(short, long)]
        name: String,

        /// Resource group (looked up when omitted)
        #[arg(short = 'g', long)]
        resource_group: Option<String>,

        /// "true" enables the admin user, anything else disables it
        #[arg(long)]
        admin_enabled: Option<String>,

        /// Storage account to switch to
        #[arg(long)]
        storage_account_name: Option<String>,

        /// Tags as key=value; pass "" to clear all tags
        #[arg(long, num_args = 0..)]
        tags: Option<Vec<String>>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FixtureCommand {
    /// Collapse long-running-operation polling in cassette files
    Shrink {
        /// Fail when an operation has no terminal response recorded
        #[arg(long)]
        strict: bool,

        /// Cassette files, processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Parse `key=value` tag arguments
///
/// A bare `key` gets an empty value and empty arguments are skipped, so
/// `--tags ""` yields an empty map (clearing all tags).
pub fn parse_tags(args: &[String]) -> Tags {
    args.iter()
        .filter(|arg| !arg.is_empty())
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (arg.to_string(), String::new()),
        })
        .collect()
}

/// Run one `acr` verb against the given collaborators
pub async fn run_acr(command: AcrCommand, services: Services<'_>, config: &Config) -> Result<CommandOutput> {
    match command {
        AcrCommand::CheckName { name } => {
            let result = commands::check_name(services, &name).await?;
            CommandOutput::one(&result, NAME_AVAILABILITY_COLUMNS)
        }
        AcrCommand::List { resource_group } => {
            let registries = commands::list(services, resource_group.as_deref()).await?;
            CommandOutput::many(&registries, REGISTRY_COLUMNS)
        }
        AcrCommand::Create {
            name,
            resource_group,
            location,
            storage_account_name,
            admin_enabled,
        } => {
            let location = config.effective_location(location.as_deref()).ok_or_else(|| {
                anyhow::anyhow!("No location given. Use --location or 'acrctl configure --location'")
            })?;
            let registry = commands::create(
                services,
                CreateRegistry {
                    registry_name: name,
                    resource_group,
                    location,
                    storage_account_name,
                    admin_enabled,
                },
            )
            .await?;

            for line in commands::service_principal_guidance(&registry) {
                eprintln!("{}", line);
            }
            CommandOutput::one(&registry, REGISTRY_COLUMNS)
        }
        AcrCommand::Delete { name, resource_group } => {
            commands::delete(services, &name, resource_group.as_deref()).await?;
            Ok(CommandOutput::empty())
        }
        AcrCommand::Show { name, resource_group } => {
            let registry = commands::show(services, &name, resource_group.as_deref()).await?;
            CommandOutput::one(&registry, REGISTRY_COLUMNS)
        }
        AcrCommand::Update {
            name,
            resource_group,
            admin_enabled,
            storage_account_name,
            tags,
        } => {
            let changes = RegistryUpdate {
                admin_user_enabled: admin_enabled,
                storage_account_name,
                tags: tags.as_deref().map(parse_tags),
            };
            if changes.is_empty() {
                tracing::warn!("acr update called without any change");
            }
            let registry =
                commands::update(services, &name, resource_group.as_deref(), changes).await?;
            CommandOutput::one(&registry, REGISTRY_COLUMNS)
        }
    }
}

/// Apply `configure` arguments and return the resulting config
pub fn run_configure(
    config: &mut Config,
    subscription: Option<String>,
    location: Option<String>,
    output: Option<OutputFormat>,
) -> Result<CommandOutput> {
    if let Some(subscription) = subscription {
        config.set_subscription(&subscription)?;
    }
    if let Some(location) = location {
        config.set_location(&location)?;
    }
    if let Some(output) = output {
        config.set_output(output)?;
    }
    CommandOutput::one(config, &[])
}

/// Shrink each cassette in order and return one summary line per file
pub fn run_fixture(command: FixtureCommand) -> Result<Vec<String>> {
    let FixtureCommand::Shrink { strict, files } = command;
    let mut summary = Vec::with_capacity(files.len());

    for path in files {
        let Some(report) = fixture::shrink_file(&path, strict)? else {
            summary.push(format!("{}: not found, skipped", path.display()));
            continue;
        };

        summary.push(format!(
            "{}: {} operation(s) collapsed, {} interaction(s) removed, {} unresolved",
            path.display(),
            report.collapsed,
            report.removed,
            report.unresolved.len()
        ));
    }

    Ok(summary)
}
