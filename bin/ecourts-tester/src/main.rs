mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Overrides;

#[derive(Parser)]
#[command(name = "ecourts-tester")]
#[command(about = "Step-by-step harness for the eCourts case-lookup API", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging (request and response bodies)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.ecourts-tester/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override api.baseUrl
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Override api.timeoutSecs
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: run each step by hand and inspect raw JSON (default)
    Shell,

    /// Run the whole lookup once, prompting only for the captcha text
    Run {
        /// State code
        #[arg(long)]
        state: String,
        /// District code
        #[arg(long)]
        district: String,
        /// Court complex code
        #[arg(long)]
        complex: String,
        /// Establishment code (optional)
        #[arg(long)]
        est: Option<String>,
        /// Party name to search for
        #[arg(long)]
        name: String,
        /// Registration year
        #[arg(long)]
        year: String,
        /// Case status: Pending, Disposed or Any (default from config)
        #[arg(long)]
        status: Option<String>,
        /// How many captchas to try before giving up
        #[arg(long, default_value = "3")]
        captcha_attempts: u32,
    },

    /// Show configuration and optionally probe the backend
    Status {
        /// Open a session against the backend to check it responds
        #[arg(long)]
        probe: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Get a value by dot-separated key (e.g. api.baseUrl)
    Get {
        key: String,
    },
    /// Set a value by dot-separated key
    Set {
        key: String,
        /// Value to set (auto-detects JSON types)
        value: String,
    },
    /// Reset config to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries JSON payloads; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let overrides = Overrides {
        config: cli.config,
        base_url: cli.base_url,
        timeout: cli.timeout,
    };

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            commands::shell::run(&overrides).await?;
        }
        Commands::Run {
            state,
            district,
            complex,
            est,
            name,
            year,
            status,
            captcha_attempts,
        } => {
            let args = commands::run_cmd::RunArgs {
                state,
                district,
                complex,
                est,
                name,
                year,
                status,
                captcha_attempts,
            };
            commands::run_cmd::run(&overrides, args).await?;
        }
        Commands::Status { probe } => {
            commands::status::run(&overrides, probe).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show(&overrides)?;
            }
            ConfigCommands::Path => {
                println!("{}", overrides.config_path().display());
            }
            ConfigCommands::Get { key } => {
                commands::config_cmd::get(&overrides, &key)?;
            }
            ConfigCommands::Set { key, value } => {
                commands::config_cmd::set(&overrides, &key, &value)?;
            }
            ConfigCommands::Reset { force } => {
                commands::config_cmd::reset(&overrides, force)?;
            }
        },
        Commands::Completions { shell } => {
            commands::completions_cmd::run(&shell)?;
        }
    }

    Ok(())
}
