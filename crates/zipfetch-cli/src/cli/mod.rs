//! CLI for the zipfetch archive service.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zipfetch_core::config;

use commands::{run_serve, run_sweep};

/// Top-level CLI for the zipfetch archive service.
#[derive(Debug, Parser)]
#[command(name = "zipfetch")]
#[command(about = "zipfetch: fetch URLs into zip archives over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP service (and the stale-archive janitor) until Ctrl-C.
    Serve {
        /// Address to listen on, overriding `listen_addr` from the config.
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
        /// Directory for named archives, overriding `storage_dir`.
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },

    /// Run one janitor cycle over the storage directory and print what it did.
    Sweep {
        /// Directory to sweep, overriding `storage_dir`.
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve { listen, dir } => {
                if let Some(addr) = listen {
                    cfg.listen_addr = addr;
                }
                if dir.is_some() {
                    cfg.storage_dir = dir;
                }
                run_serve(&cfg).await?;
            }
            CliCommand::Sweep { dir } => {
                if dir.is_some() {
                    cfg.storage_dir = dir;
                }
                run_sweep(&cfg).await?;
            }
        }

        Ok(())
    }
}
