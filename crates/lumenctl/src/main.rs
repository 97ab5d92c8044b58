//! lumenctl - ask questions with consent-gated live data.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen_common::LumenConfig;
use lumenctl::{app, commands};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumenctl")]
#[command(about = "Lumen assistant - live data for local answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $LUMEN_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a question and fetch live data for it, with consent
    Ask {
        /// The question
        query: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Report temperatures in Celsius
        #[arg(long, conflicts_with = "fahrenheit")]
        celsius: bool,

        /// Report temperatures in Fahrenheit
        #[arg(long)]
        fahrenheit: bool,
    },

    /// Show or change web search settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show this month's search usage
    Usage,

    /// Config file helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show current settings
    Show,
    /// Allow web search
    Enable,
    /// Disallow web search
    Disable,
    /// Store the search API key
    SetKey { key: String },
    /// Remove the stored API key
    ClearKey,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config
    Show,
    /// Write a default config file
    Init {
        /// Target path (defaults to the user config dir)
        path: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<LumenConfig> {
    match path {
        Some(path) => LumenConfig::load_from_path(path).context("Failed to load config"),
        None => Ok(LumenConfig::load()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("lumenctl v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Ask {
            query,
            yes,
            celsius,
            fahrenheit,
        } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("Nothing to ask");
            }
            let mut config = config;
            if celsius {
                config.weather.use_celsius = true;
            } else if fahrenheit {
                config.weather.use_celsius = false;
            }
            let app = app::build(config).await?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling fetch");
                    on_interrupt.cancel();
                }
            });

            let stdin = io::stdin();
            let mut input = stdin.lock();
            commands::ask(&app.orchestrator, &query, yes, cancel, &mut input, &mut out).await?;
        }
        Commands::Settings { action } => {
            let settings = app::open_settings(&config)?;
            match action.unwrap_or(SettingsAction::Show) {
                SettingsAction::Show => commands::show_settings(&settings, &mut out)?,
                SettingsAction::Enable => commands::set_enabled(&settings, true, &mut out)?,
                SettingsAction::Disable => commands::set_enabled(&settings, false, &mut out)?,
                SettingsAction::SetKey { key } => commands::set_api_key(&settings, &key, &mut out)?,
                SettingsAction::ClearKey => commands::clear_api_key(&settings, &mut out)?,
            }
        }
        Commands::Usage => {
            let settings = app::open_settings(&config)?;
            commands::show_usage(&settings, &mut out)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let rendered =
                    toml::to_string_pretty(&config).context("Failed to render config")?;
                write!(out, "{}", rendered)?;
            }
            ConfigAction::Init { path } => {
                let path = match path.or_else(|| LumenConfig::candidate_paths().pop()) {
                    Some(path) => path,
                    None => anyhow::bail!("No config directory available, pass a path"),
                };
                if path.exists() {
                    anyhow::bail!("{} already exists", path.display());
                }
                LumenConfig::save_default(&path).context("Failed to write config")?;
                writeln!(out, "Wrote {}", path.display())?;
            }
        },
    }

    Ok(())
}
