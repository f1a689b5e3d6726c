//! CLI command handlers, one file per command.

mod attach;
mod bench;
mod poll;
mod status;
mod submit;

pub use attach::run_attach;
pub use bench::{run_bench, BenchArgs};
pub use poll::run_poll;
pub use status::run_status;
pub use submit::{run_submit, SubmitArgs};

use std::path::{Path, PathBuf};

use kvweb_core::job::DEFAULT_BASE_NAME;

/// Base name defaulting to the structure's file stem.
fn base_name_for(pdb: &Path, explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        pdb.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string())
    })
}

/// Output directory defaulting to the working directory.
fn output_dir_or_cwd(dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match dir {
        Some(d) => Ok(d),
        None => Ok(std::env::current_dir()?),
    }
}
