//! CLI for the KVFinder-web job client.

mod commands;
mod settings_args;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kvweb_core::config;
use kvweb_core::context::KvContext;
use std::path::PathBuf;

use commands::{run_attach, run_bench, run_poll, run_status, run_submit, BenchArgs, SubmitArgs};

pub use settings_args::SettingsArgs;

/// Top-level CLI for the KVFinder-web client.
#[derive(Debug, Parser)]
#[command(name = "kvweb")]
#[command(about = "Submit cavity detection jobs to KVFinder-web and collect the results", long_about = None)]
pub struct Cli {
    /// Server URL (overrides `server_url` from config.toml).
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Job store directory (overrides `jobs_dir` from config.toml).
    #[arg(long, global = true, value_name = "DIR")]
    pub jobs_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit a structure for cavity detection.
    Submit(SubmitArgs),

    /// Track a job that already exists on the server, by its ID.
    Attach {
        /// Job identifier returned by the server.
        id: String,
        /// Structure file the job was built from.
        pdb: PathBuf,
        /// Results go to <OUTPUT_DIR>/<ID>/ (default: current directory).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Base name for result files (default: PDB file stem).
        #[arg(long, value_name = "NAME")]
        base_name: Option<String>,
    },

    /// List jobs waiting for results.
    Status,

    /// Poll the server and export finished jobs.
    Poll {
        /// Run a single cycle and exit.
        #[arg(long, conflicts_with = "until_idle")]
        once: bool,
        /// Exit after N consecutive cycles with no pending jobs.
        #[arg(long, value_name = "N")]
        until_idle: Option<u32>,
    },

    /// Submit structures over a parameter sweep and record timing statistics.
    Bench(BenchArgs),
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(server) = cli.server {
            cfg.server_url = server;
        }
        if let Some(dir) = cli.jobs_dir {
            cfg.jobs_dir = Some(dir);
        }
        tracing::debug!("loaded config: {:?}", cfg);
        let ctx = KvContext::from_config(cfg)?;

        match cli.command {
            CliCommand::Submit(args) => run_submit(&ctx, args).await?,
            CliCommand::Attach {
                id,
                pdb,
                output_dir,
                base_name,
            } => run_attach(&ctx, &id, pdb, output_dir, base_name)?,
            CliCommand::Status => run_status(&ctx)?,
            CliCommand::Poll { once, until_idle } => run_poll(&ctx, once, until_idle).await?,
            CliCommand::Bench(args) => run_bench(&ctx, args).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
