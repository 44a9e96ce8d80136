use acrctl::acr::Services;
use acrctl::azure::client::AzureClient;
use acrctl::azure::http::format_azure_error;
use acrctl::cli::{self, Cli, Command, LogLevel};
use acrctl::config::Config;
use acrctl::output::OutputFormat;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("acrctl {} started with log level: {:?}", acrctl::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("acrctl").join("acrctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".acrctl").join("acrctl.log");
    }
    PathBuf::from("acrctl.log")
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_azure_error(&err));
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let mut config = Config::load();
    let format = config.effective_output(args.output);

    match args.command {
        Command::Acr(command) => {
            let subscription = config
                .effective_subscription(args.subscription.as_deref())
                .context("No subscription configured. Set AZURE_SUBSCRIPTION_ID or use --subscription")?;
            let endpoint = config.effective_endpoint(args.endpoint.as_deref());
            tracing::info!("Using subscription: {}, endpoint: {}", subscription, endpoint);

            let client = AzureClient::new(&subscription, &endpoint)?;
            let output = cli::run_acr(command, Services::from_client(&client), &config).await?;
            print_rendered(&output.render(format)?);
        }
        Command::Configure {
            subscription,
            location,
            output,
        } => {
            let result = cli::run_configure(&mut config, subscription, location, output)?;
            print_rendered(&result.render(OutputFormat::Json)?);
        }
        Command::Fixture(command) => {
            for line in cli::run_fixture(command)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn print_rendered(text: &str) {
    if !text.is_empty() {
        println!("{}", text);
    }
}
