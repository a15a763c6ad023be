//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod crawl;
mod serve;
mod themes;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::logging;

#[derive(Parser)]
#[command(name = "datagov")]
#[command(about = "Open-government dataset harvester and tabular read API")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "DATAGOV_CONFIG")]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the portal's themes without crawling them
    Themes,

    /// Crawl themes, resolve datasets and download their files
    Crawl {
        /// Only crawl these themes (case-insensitive, repeatable)
        #[arg(short, long = "theme")]
        themes: Vec<String>,
        /// Stop each theme after this many listing pages (0 = unlimited)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Resolve dataset metadata without downloading files
        #[arg(long)]
        no_download: bool,
        /// Download directory (overrides config)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Serve converted datasets over HTTP
    Serve {
        /// Address to bind (overrides config), e.g. 0.0.0.0:3030
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (mut settings, config) = load_settings_with_options(options).await?;

    if let Commands::Crawl {
        data_dir: Some(ref data_dir),
        ..
    } = cli.command
    {
        settings.set_data_dir(data_dir.clone());
    }

    // Only crawls keep a run log; other commands log to the console.
    let log_file = matches!(cli.command, Commands::Crawl { .. }).then(|| settings.log_file());
    let _guard = logging::init(cli.verbose, log_file.as_deref())?;

    match cli.command {
        Commands::Themes => themes::cmd_themes(&settings).await,
        Commands::Crawl {
            themes,
            max_pages,
            no_download,
            ..
        } => {
            crawl::cmd_crawl(&settings, &themes, max_pages, no_download, cli.verbose).await
        }
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Config => config_cmd::cmd_config_show(&settings, &config),
    }
}
