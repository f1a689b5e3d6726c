//! Server replies for `POST /create` and `GET /{id}`.

use serde::{Deserialize, Serialize};

use super::RemoteError;
use crate::job::{JobOutput, JobStatus};

/// Status values the server reports for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Queued,
    Running,
    Completed,
    TimedOut,
    Failed,
}

impl RemoteStatus {
    pub fn is_terminal(self) -> bool {
        JobStatus::from(self).is_terminal()
    }
}

impl From<RemoteStatus> for JobStatus {
    fn from(s: RemoteStatus) -> Self {
        match s {
            RemoteStatus::Queued => JobStatus::Queued,
            RemoteStatus::Running => JobStatus::Running,
            RemoteStatus::Completed => JobStatus::Completed,
            RemoteStatus::TimedOut => JobStatus::TimedOut,
            RemoteStatus::Failed => JobStatus::Failed,
        }
    }
}

/// Result block of a finished job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteOutput {
    #[serde(default)]
    pub pdb_kv: String,
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub log: String,
}

/// Reply of `GET /{id}`.
///
/// The result fields are accepted both nested under `output` and at the top
/// level; the nested form wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: RemoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RemoteOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdb_kv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

impl StatusReply {
    /// Bare reply carrying only a status (what a pending job looks like).
    pub fn pending(status: RemoteStatus) -> Self {
        Self {
            id: None,
            status,
            output: None,
            pdb_kv: None,
            report: None,
            log: None,
            created_at: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// True if the reply carries any result text.
    pub fn has_result(&self) -> bool {
        self.output.is_some() || self.pdb_kv.is_some() || self.report.is_some() || self.log.is_some()
    }

    /// Output for `Completed` / `TimedOut` replies, `None` otherwise.
    /// Missing fields become empty strings.
    pub fn job_output(&self) -> Option<JobOutput> {
        if !JobStatus::from(self.status).has_output() {
            return None;
        }
        let nested = self.output.clone().unwrap_or_default();
        let pick = |nested: String, flat: &Option<String>| {
            if self.output.is_some() {
                nested
            } else {
                flat.clone().unwrap_or_default()
            }
        };
        Some(JobOutput {
            cavity: pick(nested.pdb_kv, &self.pdb_kv),
            report: pick(nested.report, &self.report),
            log: pick(nested.log, &self.log),
            created_at: self.created_at.clone().unwrap_or_default(),
            started_at: self.started_at.clone().unwrap_or_default(),
            ended_at: self.ended_at.clone().unwrap_or_default(),
        })
    }

    /// Size in bytes of this reply serialized as JSON.
    pub fn json_size(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}

/// Reply of `POST /create`.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateReply {
    /// A new job was queued under this id.
    Created { id: String },
    /// The same input was submitted before; the server returned that job.
    Existing(StatusReply),
}

#[derive(Deserialize)]
struct CreatedBody {
    id: String,
}

/// Parse a `POST /create` body. A body with a `status` field describes an
/// existing job; otherwise an `id` is required.
pub fn parse_create_reply(body: &[u8]) -> Result<CreateReply, RemoteError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
    if value.get("status").is_some() {
        let reply: StatusReply =
            serde_json::from_value(value).map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
        return Ok(CreateReply::Existing(reply));
    }
    let created: CreatedBody =
        serde_json::from_value(value).map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
    if created.id.trim().is_empty() {
        return Err(RemoteError::MalformedResponse("empty job id".into()));
    }
    Ok(CreateReply::Created { id: created.id })
}

/// Parse a `GET /{id}` body.
pub fn parse_status_reply(body: &[u8]) -> Result<StatusReply, RemoteError> {
    serde_json::from_slice(body).map_err(|e| RemoteError::MalformedResponse(e.to_string()))
}
