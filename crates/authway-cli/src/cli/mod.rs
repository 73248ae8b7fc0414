//! CLI entry and dispatch.

use anyhow::{Context, Result};
use authway_core::config;
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "authway")]
#[command(version = "0.1")]
#[command(about = "Authenticated request gateway CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the base origin from config
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in (capture an identity-provider callback redirect)
    Login {
        /// Callback redirect URL (skips the interactive paste)
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },

    /// Log out (clear stored credentials)
    Logout,

    /// Show the current session status
    Status,

    /// Perform an authenticated request
    Fetch {
        /// Absolute URL or path relative to the base origin
        #[arg(value_name = "TARGET")]
        target: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(short, long, value_name = "JSON")]
        data: Option<String>,

        /// Extra header in 'Name: value' form (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the base origin in the config file
    SetBaseUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Stderr logging filtered by RUST_LOG, quiet by default.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "authway=warn,authway_core=warn".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;

    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Login {
            url,
        } => commands::auth::login(&config, url.as_deref()),
        Commands::Logout => commands::auth::logout(),
        Commands::Status => commands::auth::status(&config),
        Commands::Fetch {
            target,
            method,
            data,
            headers,
        } => {
            commands::fetch::run(
                &config,
                commands::fetch::FetchOptions {
                    target: &target,
                    method: &method,
                    data: data.as_deref(),
                    headers: &headers,
                },
            )
            .await
        }
        Commands::Config {
            command,
        } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetBaseUrl {
                url,
            } => commands::config::set_base_url(&url),
        },
    }
}
