//! StackBridge Provisioning CLI
//!
//! Resolves the role definitions a stack assigns before its declarations are
//! submitted:
//! - Bearer token read from the environment
//! - Role definition catalog drained from Azure Resource Manager
//! - One identifier bound per role name through the deferred bridge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stackbridge_deferred::Engine;
use stackbridge_provision::{bind_roles, role_catalog, ProvisionConfig};
use stackbridge_roles::{ArmRoleDefinitionSource, InMemoryRoleSource, RoleDefinitionSource, RoleResolver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// StackBridge Provisioning CLI
#[derive(Parser)]
#[command(name = "stackbridge-provision")]
#[command(about = "Resolve role definitions for stack declarations")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "STACKBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Read the catalog from a JSON fixture instead of the management API
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve role names to role definition identifiers
    Resolve {
        /// Role names (defaults to the roles in the configuration)
        names: Vec<String>,
    },

    /// Print the whole role catalog as JSON
    Catalog,

    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    if let Command::Version = cli.command {
        println!("StackBridge Provision v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            let config = ProvisionConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => ProvisionConfig::default(),
    };
    config.validate()?;

    let engine = Engine::current().context("Failed to attach to the async runtime")?;

    let source: Arc<dyn RoleDefinitionSource> = match &cli.fixture {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog fixture {:?}", path))?;
            info!("Using catalog fixture {:?}", path);
            Arc::new(InMemoryRoleSource::from_json(&json)?)
        }
        None => Arc::new(ArmRoleDefinitionSource::new(
            config.catalog.endpoint.clone(),
            config.catalog.api_version.clone(),
            config.request_timeout(),
        )?),
    };

    let secret = match std::env::var(&config.token.env_var) {
        Ok(secret) if !secret.is_empty() => secret,
        _ if cli.fixture.is_some() => {
            warn!("No access token in {}, fixture mode continues without one", config.token.env_var);
            String::new()
        }
        _ => anyhow::bail!("Access token not found in environment variable {}", config.token.env_var),
    };
    let token = engine.ready(secret);

    let resolver = RoleResolver::new(source, config.resolver_context());
    let catalog = role_catalog(&resolver, &token, config.settle_delay());

    match cli.command {
        Command::Resolve { names } => {
            let names = if names.is_empty() { config.stack.roles.clone() } else { names };
            let bindings = bind_roles(&catalog, &names, config.stack.duplicate_policy).await?;
            for binding in bindings {
                println!("{}\t{}", binding.name, binding.id);
            }
        }
        Command::Catalog => {
            let lookup = catalog.await.context("Failed to resolve role catalog")?;
            println!("{}", serde_json::to_string_pretty(&lookup)?);
        }
        Command::Version => {}
    }

    Ok(())
}
