//! Local index of pending jobs.
//!
//! One directory per job id under the store root, holding `job.toml`.
//! A job's presence here means "submitted and not yet terminal"; the poller
//! deletes the entry once the job is exported or lost.

mod file;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::job::{JobDescriptor, JobError};
use crate::storage::{self, StorageError};

use file::JobFile;

/// Name of the per-job configuration file.
pub const JOB_FILE_NAME: &str = "job.toml";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("job {0} not found in store")]
    NotFound(String),

    #[error("job {id}: corrupt job file: {reason}")]
    CorruptData { id: String, reason: String },

    #[error("invalid job id {0:?}")]
    InvalidId(String),

    #[error("cannot store job: {0}")]
    Job(#[from] JobError),
}

/// Handle to the job store root. Cheap to clone; holds no open files.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    /// The root directory is created lazily by the first `save`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the given job's files.
    pub fn job_dir(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.root.join(id))
    }

    /// Persist a submitted job to `<root>/<id>/job.toml`.
    pub fn save(&self, job: &JobDescriptor) -> Result<(), StoreError> {
        let id = job.id().ok_or(JobError::MissingId)?;
        let dir = self.job_dir(id)?;
        let text = JobFile::from_job(job)
            .to_toml()
            .map_err(|e| StoreError::CorruptData {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        storage::ensure_dir(&dir)?;
        storage::write_atomic(&dir.join(JOB_FILE_NAME), text.as_bytes())?;
        tracing::debug!(job_id = id, status = %job.status(), "job saved");
        Ok(())
    }

    /// Load the job stored under `id`.
    pub fn load(&self, id: &str) -> Result<JobDescriptor, StoreError> {
        let path = self.job_dir(id)?.join(JOB_FILE_NAME);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::CorruptData {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(StorageError::new("read", path, e).into()),
        };
        let corrupt = |reason: String| StoreError::CorruptData {
            id: id.to_string(),
            reason,
        };
        let file: JobFile = toml::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
        JobDescriptor::restore(
            id.to_string(),
            file.id_added_manually,
            file.status,
            file.files.pdb,
            file.files.ligand,
            file.files.output,
            file.files.base_name,
            file.settings,
        )
        .map_err(|e| corrupt(format!("status {}: {}", file.status, e)))
    }

    /// Ids of all stored jobs. A missing root means no jobs.
    pub fn list_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(StorageError::new("list", &self.root, e).into()),
        };
        let mut ids = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::new("list", &self.root, e))?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => {
                    ids.insert(name);
                }
                Err(name) => {
                    tracing::warn!(name = ?name, "ignoring non UTF-8 entry in job store");
                }
            }
        }
        Ok(ids)
    }

    /// Remove the job's directory and everything in it. Missing entries are fine.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let dir = self.job_dir(id)?;
        storage::remove_dir_if_exists(&dir)?;
        tracing::debug!(job_id = id, "job removed from store");
        Ok(())
    }
}

/// Ids become directory names; reject anything that could escape the root.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains('\0');
    if bad {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
