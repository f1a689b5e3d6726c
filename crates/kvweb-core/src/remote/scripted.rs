//! In-memory server used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{CreateReply, CreateRequest, RemoteError, RemoteService, RemoteStatus, StatusReply};

/// Answers `status` from a per-id script; the last entry repeats forever.
/// Unknown ids are `NotFound`. `create` hands out ids `job-1`, `job-2`, ...
#[derive(Default)]
pub(crate) struct ScriptedRemote {
    scripts: Mutex<HashMap<String, VecDeque<Result<StatusReply, RemoteError>>>>,
    created: Mutex<Vec<serde_json::Value>>,
    status_calls: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, id: &str, replies: Vec<Result<StatusReply, RemoteError>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), replies.into());
    }

    pub fn created(&self) -> Vec<serde_json::Value> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }
}

impl RemoteService for ScriptedRemote {
    fn create(&self, request: &CreateRequest<'_>) -> Result<CreateReply, RemoteError> {
        let mut created = self.created.lock().unwrap();
        created.push(serde_json::to_value(request).unwrap());
        Ok(CreateReply::Created {
            id: format!("job-{}", created.len()),
        })
    }

    fn status(&self, id: &str) -> Result<StatusReply, RemoteError> {
        self.status_calls.lock().unwrap().push(id.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(id) else {
            return Err(RemoteError::NotFound);
        };
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(StatusReply::pending(RemoteStatus::Queued)))
        }
    }
}

/// A completed reply with the given result fields.
pub(crate) fn completed(pdb_kv: &str, report: &str, log: &str) -> StatusReply {
    let mut reply = StatusReply::pending(RemoteStatus::Completed);
    reply.output = Some(super::RemoteOutput {
        pdb_kv: pdb_kv.into(),
        report: report.into(),
        log: log.into(),
    });
    reply.created_at = Some("2021-09-15T12:00:00Z".into());
    reply.started_at = Some("2021-09-15T12:00:01.5Z".into());
    reply.ended_at = Some("2021-09-15T12:00:04Z".into());
    reply
}
