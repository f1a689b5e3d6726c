//! `kvweb status`: list jobs waiting for results.

use anyhow::Result;
use kvweb_core::context::KvContext;

pub fn run_status(ctx: &KvContext) -> Result<()> {
    let store = ctx.store();
    let ids = store.list_ids()?;
    if ids.is_empty() {
        println!("No pending jobs in {}.", store.root().display());
        return Ok(());
    }
    println!("{:<22} {:<10} {}", "ID", "STATUS", "PDB");
    for id in ids {
        match store.load(&id) {
            Ok(job) => {
                let manual = if job.id_added_manually() { " (attached)" } else { "" };
                println!("{:<22} {:<10} {}{}", id, job.status(), job.pdb_path.display(), manual);
            }
            Err(e) => println!("{:<22} {:<10} {}", id, "unreadable", e),
        }
    }
    Ok(())
}
