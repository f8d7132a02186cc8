//! # initrift CLI
//!
//! Builds initramfs images: newc cpio archives of one or more directory
//! trees, optionally compressed.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use initrift_config::logging::init_logging;
use initrift_config::{Config, LogLevel, PROJECT_CONFIG_PATH};

mod create;
mod output;

/// initrift - reproducible initramfs archive builder
#[derive(Parser)]
#[command(name = "initrift")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Raise the log level one step per use (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack source directories into a newc cpio archive
    Create(create::CreateArgs),

    /// Inspect or initialize configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print global and project config locations
    Path,
    /// Write the default configuration to the project location
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    init_logging(log_level(&config, cli.verbose));

    match cli.command {
        Commands::Create(args) => create::run(args, &config),
        Commands::Config { command } => cmd_config(command, &config),
    }
}

fn log_level(config: &Config, verbose: u8) -> LogLevel {
    config.logging.level.raised(verbose)
}

fn cmd_config(command: ConfigCommands, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Path => {
            match Config::global_config_path() {
                Some(path) => println!("Global:  {}", path.display()),
                None => println!("Global:  (no home directory)"),
            }
            println!("Project: {}", PROJECT_CONFIG_PATH);
        }
        ConfigCommands::Init { force } => {
            let path = Path::new(PROJECT_CONFIG_PATH);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, Config::default_toml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Initialized {}", path.display());
        }
    }
    Ok(())
}
