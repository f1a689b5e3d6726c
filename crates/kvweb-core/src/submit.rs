//! Submitter: sends a job to the server and records it in the job store.
//!
//! A job enters the store only after the server accepted it. Any failure
//! before that point leaves the store untouched.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::job::{JobDescriptor, JobError, JobStatus};
use crate::remote::{CreateReply, CreateRequest, RemoteError, RemoteService, StatusReply};
use crate::store::{validate_id, JobStore, StoreError};

/// What happened to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Fresh job, now queued on the server and tracked in the store.
    Queued(String),
    /// The server already had this input under a pending job; now tracked.
    AlreadyPending(String),
    /// The server already finished this input. Not stored; when the status
    /// has output it is attached to the descriptor, ready for export.
    AlreadyFinished { id: String, status: JobStatus },
}

impl SubmitOutcome {
    pub fn id(&self) -> &str {
        match self {
            SubmitOutcome::Queued(id) | SubmitOutcome::AlreadyPending(id) => id,
            SubmitOutcome::AlreadyFinished { id, .. } => id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("cannot read input {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("server replied HTTP {code}: {body}")]
    Http { code: u32, body: String },

    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Job(#[from] JobError),
}

impl From<RemoteError> for SubmitError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Network(m) | RemoteError::Transport(m) => SubmitError::Network(m),
            RemoteError::Http { code, body } => SubmitError::Http { code, body },
            RemoteError::NotFound => SubmitError::Http {
                code: 404,
                body: String::new(),
            },
            RemoteError::MalformedResponse(m) => SubmitError::MalformedResponse(m),
        }
    }
}

#[derive(Clone)]
pub struct Submitter {
    store: JobStore,
    remote: Arc<dyn RemoteService>,
}

impl Submitter {
    pub fn new(store: JobStore, remote: Arc<dyn RemoteService>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn remote(&self) -> &Arc<dyn RemoteService> {
        &self.remote
    }

    /// Submit a `Created` job. Reads the structure files unless a snapshot
    /// was supplied, posts them, and persists the job on success.
    pub fn submit(&self, job: &mut JobDescriptor) -> Result<SubmitOutcome, SubmitError> {
        if job.status() != JobStatus::Created {
            return Err(JobError::AlreadySubmitted(job.status()).into());
        }
        let pdb_path = job.pdb_path.clone();
        let input = job
            .capture_input()
            .map_err(|source| SubmitError::Input {
                path: pdb_path.clone(),
                source,
            })?
            .clone();

        let request = CreateRequest {
            input: &input,
            settings: &job.settings,
        };
        let reply = self.remote.create(&request).map_err(|e| {
            tracing::warn!(path = %pdb_path.display(), error = %e, "job submission failed");
            SubmitError::from(e)
        })?;

        // The caller's descriptor only changes once the outcome is settled.
        let mut submitted = job.clone();
        let outcome = match reply {
            CreateReply::Created { id } => {
                check_id(&id)?;
                submitted.mark_submitted(id.as_str(), JobStatus::Queued)?;
                self.store.save(&submitted)?;
                tracing::info!(job_id = %id, path = %pdb_path.display(), "job submitted");
                SubmitOutcome::Queued(id)
            }
            CreateReply::Existing(reply) => self.resolve_existing(&mut submitted, reply)?,
        };
        *job = submitted;
        Ok(outcome)
    }

    /// Track a job created elsewhere (see [`JobDescriptor::reattach`]) without
    /// contacting the server. The poller resolves its status.
    pub fn attach(&self, job: &JobDescriptor) -> Result<String, SubmitError> {
        let id = job.id().ok_or(JobError::MissingId)?;
        if job.status().is_terminal() {
            return Err(JobError::AlreadySubmitted(job.status()).into());
        }
        self.store.save(job)?;
        tracing::info!(job_id = id, manual = job.id_added_manually(), "job attached");
        Ok(id.to_string())
    }

    /// The server answered with an existing job for the same input.
    fn resolve_existing(
        &self,
        job: &mut JobDescriptor,
        reply: StatusReply,
    ) -> Result<SubmitOutcome, SubmitError> {
        let id = match reply.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => {
                return Err(SubmitError::MalformedResponse(
                    "existing job reply without id".into(),
                ))
            }
        };
        check_id(&id)?;
        let status = JobStatus::from(reply.status);
        tracing::info!(job_id = %id, %status, "server already knows this input");

        match status {
            JobStatus::Queued | JobStatus::Running => {
                job.mark_submitted(id.as_str(), status)?;
                self.store.save(job)?;
                Ok(SubmitOutcome::AlreadyPending(id))
            }
            JobStatus::Failed => {
                job.mark_submitted(id.as_str(), JobStatus::Failed)?;
                Ok(SubmitOutcome::AlreadyFinished { id, status })
            }
            _ => {
                let full = if reply.has_result() {
                    reply
                } else {
                    self.remote.status(&id)?
                };
                let output = full.job_output().ok_or_else(|| {
                    SubmitError::MalformedResponse(format!(
                        "job {} reported {} but has no output",
                        id,
                        JobStatus::from(full.status)
                    ))
                })?;
                job.mark_submitted(id.as_str(), JobStatus::Queued)?;
                job.complete(JobStatus::from(full.status), output)?;
                Ok(SubmitOutcome::AlreadyFinished {
                    id,
                    status: job.status(),
                })
            }
        }
    }
}

/// Server ids name directories in the store and the output tree.
fn check_id(id: &str) -> Result<(), SubmitError> {
    validate_id(id).map_err(|_| SubmitError::MalformedResponse(format!("unusable job id {:?}", id)))
}
