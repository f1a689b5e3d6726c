//! `kvweb attach <id> <pdb>`: track a job submitted elsewhere.

use anyhow::Result;
use kvweb_core::context::KvContext;
use kvweb_core::job::JobDescriptor;
use kvweb_core::settings::Settings;
use std::path::PathBuf;

use super::{base_name_for, output_dir_or_cwd};

pub fn run_attach(
    ctx: &KvContext,
    id: &str,
    pdb: PathBuf,
    output_dir: Option<PathBuf>,
    base_name: Option<String>,
) -> Result<()> {
    let base_name = base_name_for(&pdb, base_name);
    let job = JobDescriptor::reattach(id, pdb, output_dir_or_cwd(output_dir)?, base_name, Settings::default())?;
    let id = ctx.submitter().attach(&job)?;
    println!("Tracking job {}. Run `kvweb poll` to collect results.", id);
    Ok(())
}
