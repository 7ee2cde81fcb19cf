//! Binary entry point for company-registry.
//!
//! Serves the HTTP API and exposes import/export as one-shot commands.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use company_registry::api::{self, AppState};
use company_registry::config::RegistryConfig;
use company_registry::io::{ExportService, Format, ImportService, ImportStatus};
use company_registry::observability::{self, InitOptions};
use company_registry::storage::{CompanyStore, SqliteCompanyStore};
use company_registry::{CompanyService, CompanyValidator};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Company registry - hierarchical company records over REST.
#[derive(Parser)]
#[command(name = "company-registry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Bind host (overrides configuration).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides configuration).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Import companies from a CSV or JSON file.
    Import {
        /// File to import.
        file: PathBuf,

        /// Format: csv or json (default: from the file extension).
        #[arg(short, long)]
        format: Option<Format>,
    },

    /// Export all companies to a CSV or JSON file.
    Export {
        /// Destination file.
        file: PathBuf,

        /// Format: csv or json (default: from the file extension).
        #[arg(short, long)]
        format: Option<Format>,
    },

    /// Show the effective configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to read .env file: {e}");
        return ExitCode::FAILURE;
    }

    let config = match RegistryConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let expose_metrics = matches!(cli.command, Commands::Serve { .. });
    let observability = match observability::init_from_config(
        &config,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: expose_metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli.command, config).await;
    if let Some(metrics) = observability.metrics() {
        tracing::debug!(snapshot = %metrics.render(), "Metrics at exit");
    }

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: RegistryConfig) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Import { file, format } => cmd_import(&config, &file, format),
        Commands::Export { file, format } => cmd_export(&config, &file, format),
        Commands::Config { show } => cmd_config(&config, show),
    }
}

/// Opens the configured store.
fn open_store(config: &RegistryConfig) -> anyhow::Result<Arc<dyn CompanyStore>> {
    let location = config
        .database_location()
        .context("invalid database URI")?;
    let store = SqliteCompanyStore::open(&location)
        .with_context(|| format!("failed to open database {location}"))?;
    tracing::debug!(database = %location, "Store opened");
    Ok(Arc::new(store))
}

async fn cmd_serve(
    mut config: RegistryConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<ExitCode> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::new(open_store(&config)?, &config);
    api::serve(state, &config)
        .await
        .context("HTTP server failed")?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_import(
    config: &RegistryConfig,
    file: &Path,
    format: Option<Format>,
) -> anyhow::Result<ExitCode> {
    let companies = Arc::new(CompanyService::new(
        open_store(config)?,
        CompanyValidator::new(config.limits.clone()),
    ));
    let report = ImportService::new(companies)
        .import_from_file(file, format)
        .with_context(|| format!("failed to import {}", file.display()))?;

    println!("{}", report.summary());
    println!(
        "Created: {}, updated: {}, failed: {}",
        report.created, report.updated, report.failed
    );
    for row in &report.errors {
        println!("  row {}: {}", row.index, row.errors);
    }

    Ok(if report.status() == ImportStatus::Complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_export(
    config: &RegistryConfig,
    file: &Path,
    format: Option<Format>,
) -> anyhow::Result<ExitCode> {
    let result = ExportService::new(open_store(config)?)
        .export_to_file(file, format)
        .with_context(|| format!("failed to export to {}", file.display()))?;

    if !result.has_exports() {
        println!("No companies stored; wrote an empty {} export", result.format);
        return Ok(ExitCode::SUCCESS);
    }
    println!(
        "Exported {} companies as {} to {}",
        result.exported,
        result.format,
        file.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(config: &RegistryConfig, show: bool) -> anyhow::Result<ExitCode> {
    if !show {
        println!("Use --show to display the current configuration");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Configuration:");
    println!("  Environment: {}", config.environment);
    println!("  Debug: {}", config.debug);
    println!("  Database URI: {}", config.database.uri);
    println!("  Listen: {}", config.bind_address());
    println!("  Max upload bytes: {}", config.server.max_upload_bytes);
    println!("  Log format: {}", config.logging.format);
    if let Some(filter) = &config.logging.filter {
        println!("  Log filter: {filter}");
    }
    if let Some(file) = &config.logging.file {
        println!("  Log file: {}", file.display());
    }
    println!(
        "  Metrics: {} (port {})",
        if config.metrics.enabled { "enabled" } else { "disabled" },
        config.metrics.port
    );
    match RegistryConfig::default_path() {
        Some(path) => println!("  Default config file: {}", path.display()),
        None => println!("  Default config file: unavailable"),
    }
    Ok(ExitCode::SUCCESS)
}
