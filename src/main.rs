//! daw-jira-gateway — Jira Cloud gateway behind the D&A workspace screens.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use daw_jira_gateway::api::AppState;
use daw_jira_gateway::config::GatewayConfig;
use daw_jira_gateway::registry::ProjectRegistry;
use daw_jira_gateway::api;
use jira_api::{JiraClient, JiraConfig};

#[derive(Parser)]
#[command(name = "daw-jira-gateway")]
#[command(about = "Jira Cloud gateway service for the D&A workspace")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to listen on (overrides DAW_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address (overrides DAW_BIND)
        #[arg(short, long)]
        bind: Option<String>,

        /// Project registry file (overrides DAW_REGISTRY_PATH)
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Validate the Jira credentials in the environment
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("daw_jira_gateway=info".parse()?)
                .add_directive("jira_api=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            registry,
        } => {
            let mut config = GatewayConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(path) = registry {
                config.registry_path = Some(path);
            }
            run_server(config).await
        }

        Commands::CheckConfig => check_config().await,
    }
}

async fn run_server(config: GatewayConfig) -> Result<()> {
    let registry = Arc::new(ProjectRegistry::new(config.resolved_registry_path()));
    let state = AppState::from_env(registry, config.fields.clone());
    let app = api::router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("gateway listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn check_config() -> Result<()> {
    let config = match JiraConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            println!("✗ {err}");
            println!("  Set JIRA_DOMAIN, JIRA_EMAIL and JIRA_API_TOKEN, then retry.");
            return Ok(());
        }
    };
    println!("✓ credentials present for {}", config.base_url);

    let client = JiraClient::new(config)?;
    match client.get_myself().await {
        Ok(user) => {
            let who = user
                .display_name
                .or(user.email_address)
                .unwrap_or_else(|| "unknown account".to_string());
            println!("✓ authenticated against Jira as {who}");
        }
        Err(err) => println!("✗ Jira rejected the credentials: {err}"),
    }

    Ok(())
}
