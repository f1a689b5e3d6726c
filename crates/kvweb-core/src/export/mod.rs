//! Result exporter: turns a finished job into files under
//! `<output_directory>/<id>/`.
//!
//! Artifacts are staged as `.part` files and renamed into place only after
//! every one of them was written, so a failed export leaves no partial set
//! behind. Exporting the same job twice produces identical files.

mod log;
mod parameters;
mod report;

pub use log::filter_log;
pub use parameters::render_parameters;
pub use report::{rewrite_report, REPORT_HEADER};

use std::path::{Path, PathBuf};

use crate::job::{JobDescriptor, JobStatus};
use crate::storage::{self, Staging, StorageError};
use crate::store::validate_id;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("job in status {status} has no output to export")]
    InvalidState { status: JobStatus },

    #[error("job id {0:?} cannot be used as a directory name")]
    InvalidId(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("job {id}: cannot rewrite results report: {reason}")]
    Report { id: String, reason: String },
}

/// Paths written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArtifacts {
    pub directory: PathBuf,
    pub cavity: PathBuf,
    pub report: PathBuf,
    pub log: PathBuf,
    /// Absent for jobs whose id was entered by hand.
    pub parameters: Option<PathBuf>,
}

impl ExportedArtifacts {
    /// Artifact paths in write order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        [&self.cavity, &self.report, &self.log]
            .into_iter()
            .chain(self.parameters.as_ref())
            .map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultExporter;

impl ResultExporter {
    pub fn new() -> Self {
        Self
    }

    /// Write all artifacts for a `Completed` or `TimedOut` job.
    pub fn export(&self, job: &JobDescriptor) -> Result<ExportedArtifacts, ExportError> {
        let invalid = || ExportError::InvalidState {
            status: job.status(),
        };
        if !job.status().has_output() {
            return Err(invalid());
        }
        let (Some(id), Some(output)) = (job.id(), job.output()) else {
            return Err(invalid());
        };
        if validate_id(id).is_err() {
            return Err(ExportError::InvalidId(id.to_string()));
        }

        let directory = job.output_directory.join(id);
        let artifacts = ExportedArtifacts {
            cavity: directory.join(format!("{}.KVFinder.output.pdb", job.base_name)),
            report: directory.join(format!("{}.KVFinder.results.toml", job.base_name)),
            log: directory.join(format!("{}.log", id)),
            parameters: (!job.id_added_manually())
                .then(|| directory.join(format!("{}_parameters.toml", job.base_name))),
            directory,
        };

        let report = rewrite_report(
            &output.report,
            &job.pdb_path,
            job.ligand_path(),
            &artifacts.cavity,
        )
        .map_err(|reason| ExportError::Report {
            id: id.to_string(),
            reason,
        })?;
        let log = filter_log(&output.log, id);
        let parameters = match &artifacts.parameters {
            Some(_) => Some(
                render_parameters(&job.pdb_path, job.ligand_path(), &job.settings).map_err(|e| {
                    ExportError::Report {
                        id: id.to_string(),
                        reason: e.to_string(),
                    }
                })?,
            ),
            None => None,
        };

        storage::ensure_dir(&artifacts.directory)?;
        let mut staging = Staging::new();
        staging.stage(&artifacts.cavity, output.cavity.as_bytes())?;
        staging.stage(&artifacts.report, report.as_bytes())?;
        staging.stage(&artifacts.log, log.as_bytes())?;
        if let (Some(path), Some(text)) = (&artifacts.parameters, &parameters) {
            staging.stage(path, text.as_bytes())?;
        }
        staging.commit()?;

        tracing::info!(
            job_id = id,
            status = %job.status(),
            path = %artifacts.directory.display(),
            "job results exported"
        );
        Ok(artifacts)
    }
}
