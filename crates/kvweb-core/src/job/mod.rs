//! Job descriptor: the unit of work tracked from submission to export.
//!
//! `id`, `status` and `output` are private and only change through the
//! transition methods, which keep two invariants:
//!
//! - `id` is set if and only if the status is not `Created`;
//! - `output` is set if and only if the status is `Completed` or `TimedOut`.

mod input;
mod output;
mod status;

pub use input::JobInput;
pub use output::{JobOutput, JobTimings, TimestampError};
pub use status::JobStatus;

use std::io;
use std::path::{Path, PathBuf};

use crate::settings::Settings;

/// Default base name for exported artifacts.
pub const DEFAULT_BASE_NAME: &str = "output";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("job was already submitted (status {0})")]
    AlreadySubmitted(JobStatus),

    #[error("job has no id yet")]
    MissingId,

    #[error("empty job id")]
    EmptyId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    id: Option<String>,
    id_added_manually: bool,
    /// Structure file the job was built from.
    pub pdb_path: PathBuf,
    pub ligand_path: Option<PathBuf>,
    /// Artifacts are written under `<output_directory>/<id>/`.
    pub output_directory: PathBuf,
    pub base_name: String,
    pub settings: Settings,
    input: Option<JobInput>,
    status: JobStatus,
    output: Option<JobOutput>,
}

impl JobDescriptor {
    /// New local job in `Created` status.
    pub fn new(
        pdb_path: impl Into<PathBuf>,
        output_directory: impl Into<PathBuf>,
        base_name: impl Into<String>,
        settings: Settings,
    ) -> Self {
        Self {
            id: None,
            id_added_manually: false,
            pdb_path: pdb_path.into(),
            ligand_path: None,
            output_directory: output_directory.into(),
            base_name: base_name.into(),
            settings,
            input: None,
            status: JobStatus::Created,
            output: None,
        }
    }

    /// Descriptor for a job that already exists on the server, tracked by an
    /// id the user typed in. Starts as `Queued`; the poller resolves the rest.
    pub fn reattach(
        id: impl Into<String>,
        pdb_path: impl Into<PathBuf>,
        output_directory: impl Into<PathBuf>,
        base_name: impl Into<String>,
        settings: Settings,
    ) -> Result<Self, JobError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(JobError::EmptyId);
        }
        let mut job = Self::new(pdb_path, output_directory, base_name, settings);
        job.id = Some(id);
        job.id_added_manually = true;
        job.status = JobStatus::Queued;
        Ok(job)
    }

    /// Rebuild a pending job from persisted state (used by the job store).
    pub(crate) fn restore(
        id: String,
        id_added_manually: bool,
        status: JobStatus,
        pdb_path: PathBuf,
        ligand_path: Option<PathBuf>,
        output_directory: PathBuf,
        base_name: String,
        settings: Settings,
    ) -> Result<Self, JobError> {
        if !matches!(status, JobStatus::Queued | JobStatus::Running) {
            return Err(JobError::InvalidTransition {
                from: JobStatus::Created,
                to: status,
            });
        }
        Ok(Self {
            id: Some(id),
            id_added_manually,
            pdb_path,
            ligand_path,
            output_directory,
            base_name,
            settings,
            input: None,
            status,
            output: None,
        })
    }

    pub fn with_ligand(mut self, ligand_path: impl Into<PathBuf>) -> Self {
        self.ligand_path = Some(ligand_path.into());
        self
    }

    /// Use an in-memory snapshot instead of reading `pdb_path` at submission.
    pub fn with_input(mut self, input: JobInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn id_added_manually(&self) -> bool {
        self.id_added_manually
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn output(&self) -> Option<&JobOutput> {
        self.output.as_ref()
    }

    pub fn input(&self) -> Option<&JobInput> {
        self.input.as_ref()
    }

    pub fn ligand_path(&self) -> Option<&Path> {
        self.ligand_path.as_deref()
    }

    /// Read the structure files once; later calls reuse the snapshot.
    pub fn capture_input(&mut self) -> io::Result<&JobInput> {
        if self.input.is_none() {
            self.input = Some(JobInput::read(&self.pdb_path, self.ligand_path.as_deref())?);
        }
        Ok(self.input.get_or_insert_with(JobInput::default))
    }

    /// Record the server-assigned id. Only valid on a `Created` job and only
    /// for statuses without output (`Queued`, `Running`, `Failed`).
    pub fn mark_submitted(&mut self, id: impl Into<String>, status: JobStatus) -> Result<(), JobError> {
        if self.status != JobStatus::Created {
            return Err(JobError::AlreadySubmitted(self.status));
        }
        if status == JobStatus::Created || status.has_output() {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        let id = id.into();
        if id.trim().is_empty() {
            return Err(JobError::EmptyId);
        }
        self.id = Some(id);
        self.status = status;
        Ok(())
    }

    /// Apply a non-terminal status reported by the server.
    pub fn refresh_status(&mut self, status: JobStatus) -> Result<(), JobError> {
        if !matches!(status, JobStatus::Queued | JobStatus::Running) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.transition(status)
    }

    /// Attach the server result. `status` must be `Completed` or `TimedOut`.
    pub fn complete(&mut self, status: JobStatus, output: JobOutput) -> Result<(), JobError> {
        if !status.has_output() {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.transition(status)?;
        self.output = Some(output);
        Ok(())
    }

    /// The server reported the computation as failed. No output exists.
    pub fn fail(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Failed)
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if self.id.is_none() {
            return Err(JobError::MissingId);
        }
        if !self.status.can_transition_to(next) || self.status == JobStatus::Created {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
