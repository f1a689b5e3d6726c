//! `kvweb submit <pdb>`: send one structure to the server.

use anyhow::Result;
use clap::Args;
use kvweb_core::context::KvContext;
use kvweb_core::job::JobDescriptor;
use kvweb_core::submit::SubmitOutcome;
use std::path::PathBuf;

use super::{base_name_for, output_dir_or_cwd};
use crate::cli::SettingsArgs;

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Structure file (PDB).
    pub pdb: PathBuf,
    /// Ligand structure file; turns ligand mode on.
    #[arg(long, value_name = "PDB")]
    pub ligand: Option<PathBuf>,
    /// Results go to <OUTPUT_DIR>/<ID>/ (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Base name for result files (default: PDB file stem).
    #[arg(long, value_name = "NAME")]
    pub base_name: Option<String>,
    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub async fn run_submit(ctx: &KvContext, args: SubmitArgs) -> Result<()> {
    let settings = args.settings.to_settings(args.ligand.is_some())?;
    let base_name = base_name_for(&args.pdb, args.base_name);
    let mut job = JobDescriptor::new(args.pdb, output_dir_or_cwd(args.output_dir)?, base_name, settings);
    if let Some(ligand) = args.ligand {
        job = job.with_ligand(ligand);
    }

    let (outcome, artifacts) = tokio::task::block_in_place(|| ctx.submit(&mut job))?;
    match &outcome {
        SubmitOutcome::Queued(id) => println!("Job {} queued. Run `kvweb poll` to collect results.", id),
        SubmitOutcome::AlreadyPending(id) => {
            println!("Server already has this job as {} ({}); tracking it.", id, job.status())
        }
        SubmitOutcome::AlreadyFinished { id, status } => {
            println!("Server already finished this job as {} ({}).", id, status);
        }
    }
    if let Some(a) = artifacts {
        println!("Results written to {}", a.directory.display());
    }
    Ok(())
}
