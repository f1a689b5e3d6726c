//! Poller: background loop that drives stored jobs to completion.
//!
//! Each cycle walks the job store in id order and asks the server for the
//! status of every id, one at a time. Finished jobs are exported and then
//! removed from the store; a failed export is logged and not retried.
//! Errors are per id: one bad job never aborts the cycle.

mod handle;

pub use handle::PollerHandle;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::export::{ExportError, ExportedArtifacts, ResultExporter};
use crate::job::{JobDescriptor, JobStatus};
use crate::remote::{RemoteError, RemoteService, StatusReply};
use crate::store::{JobStore, StoreError};

/// Pacing of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between two ids within a cycle.
    pub id_interval: Duration,
    /// Pause between cycles.
    pub cycle_interval: Duration,
    /// Stop after this many consecutive cycles found the store empty.
    /// `None` runs until stopped.
    pub idle_cycles_to_stop: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            id_interval: Duration::from_secs(1),
            cycle_interval: Duration::from_secs(10),
            idle_cycles_to_stop: None,
        }
    }
}

/// What one cycle did with one id.
#[derive(Debug)]
pub enum PollOutcome {
    /// Still queued or running on the server.
    StillPending(JobStatus),
    /// Results written; the store entry is gone.
    Exported {
        job: Box<JobDescriptor>,
        artifacts: ExportedArtifacts,
        /// Size of the status reply serialized as JSON.
        json_size: usize,
    },
    /// The job finished but writing its artifacts failed. The store entry is gone.
    ExportFailed(ExportError),
    /// The server reported the computation as failed. The store entry is gone.
    Failed,
    /// The server does not know the id. The store entry is gone.
    Vanished,
    /// The server could not be reached; the job stays in the store.
    Unreachable(RemoteError),
    /// The stored job could not be read; left untouched.
    Skipped(StoreError),
}

impl PollOutcome {
    /// True when the id left the store during this cycle.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PollOutcome::Exported { .. }
                | PollOutcome::ExportFailed(_)
                | PollOutcome::Failed
                | PollOutcome::Vanished
        )
    }
}

#[derive(Debug)]
pub struct IdReport {
    pub id: String,
    pub outcome: PollOutcome,
}

/// Everything one poll cycle observed.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// 1-based cycle number within a run (0 for a standalone `poll_once`).
    pub cycle: u64,
    pub entries: Vec<IdReport>,
    /// Set when the store itself could not be listed.
    pub list_error: Option<String>,
    /// The cycle was cut short by a stop request.
    pub interrupted: bool,
}

impl CycleReport {
    /// The store was listed successfully and held no ids.
    pub fn is_idle(&self) -> bool {
        self.list_error.is_none() && self.entries.is_empty()
    }

    pub fn exported(&self) -> impl Iterator<Item = (&JobDescriptor, &ExportedArtifacts, usize)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            PollOutcome::Exported {
                job,
                artifacts,
                json_size,
            } => Some((job.as_ref(), artifacts, *json_size)),
            _ => None,
        })
    }
}

pub struct Poller {
    store: JobStore,
    remote: Arc<dyn RemoteService>,
    exporter: ResultExporter,
    config: PollConfig,
}

impl Poller {
    pub fn new(
        store: JobStore,
        remote: Arc<dyn RemoteService>,
        exporter: ResultExporter,
        config: PollConfig,
    ) -> Self {
        Self {
            store,
            remote,
            exporter,
            config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Run a single cycle over every stored id.
    pub async fn poll_once(&self) -> CycleReport {
        self.cycle(0, None).await
    }

    /// Cycle until `stop` turns true (or its sender is dropped), or until the
    /// idle limit is reached. `on_cycle` receives every report. Returns the
    /// number of cycles run.
    pub async fn run<F>(&self, mut stop: watch::Receiver<bool>, mut on_cycle: F) -> u64
    where
        F: FnMut(CycleReport),
    {
        let mut cycles = 0u64;
        let mut idle = 0u32;
        tracing::info!(root = %self.store.root().display(), "poller started");
        loop {
            if *stop.borrow_and_update() {
                break;
            }
            cycles += 1;
            let report = self.cycle(cycles, Some(&mut stop)).await;
            let interrupted = report.interrupted;
            idle = if report.is_idle() { idle + 1 } else { 0 };
            on_cycle(report);
            if interrupted {
                break;
            }
            if let Some(limit) = self.config.idle_cycles_to_stop {
                if idle >= limit {
                    tracing::info!(cycles, "job store idle, poller stopping");
                    break;
                }
            }
            if pause(self.config.cycle_interval, &mut stop).await {
                break;
            }
        }
        tracing::info!(cycles, "poller stopped");
        cycles
    }

    /// Run on a dedicated task. Reports are sent to `reports` when given.
    pub fn spawn(self, reports: Option<mpsc::UnboundedSender<CycleReport>>) -> PollerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(stop_rx, |report| {
                if let Some(tx) = &reports {
                    let _ = tx.send(report);
                }
            })
            .await
        });
        PollerHandle::new(stop_tx, task)
    }

    async fn cycle(&self, number: u64, mut stop: Option<&mut watch::Receiver<bool>>) -> CycleReport {
        let mut report = CycleReport {
            cycle: number,
            ..CycleReport::default()
        };
        let ids = match self.store.list_ids() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list job store");
                report.list_error = Some(e.to_string());
                return report;
            }
        };
        let count = ids.len();
        for (i, id) in ids.into_iter().enumerate() {
            let outcome = self.poll_id(&id).await;
            report.entries.push(IdReport { id, outcome });
            if i + 1 == count {
                break;
            }
            let stopped = match stop.as_deref_mut() {
                Some(rx) => pause(self.config.id_interval, rx).await,
                None => {
                    tokio::time::sleep(self.config.id_interval).await;
                    false
                }
            };
            if stopped {
                report.interrupted = true;
                break;
            }
        }
        report
    }

    async fn poll_id(&self, id: &str) -> PollOutcome {
        let mut job = match self.store.load(id) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(job_id = id, error = %e, "skipping unreadable job");
                return PollOutcome::Skipped(e);
            }
        };

        let remote = Arc::clone(&self.remote);
        let owned_id = id.to_string();
        let reply = match tokio::task::spawn_blocking(move || remote.status(&owned_id)).await {
            Ok(reply) => reply,
            Err(e) => Err(RemoteError::Transport(format!("status task: {}", e))),
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(RemoteError::NotFound) => {
                tracing::warn!(job_id = id, "job unknown to server, dropping it");
                self.forget(id);
                return PollOutcome::Vanished;
            }
            Err(e) => {
                tracing::warn!(job_id = id, error = %e, "status request failed");
                return PollOutcome::Unreachable(e);
            }
        };

        let status = JobStatus::from(reply.status);
        match status {
            JobStatus::Queued | JobStatus::Running => {
                if job.status() != status {
                    let saved = job
                        .refresh_status(status)
                        .map_err(StoreError::from)
                        .and_then(|()| self.store.save(&job));
                    match saved {
                        Ok(()) => tracing::debug!(job_id = id, %status, "status changed"),
                        Err(e) => tracing::warn!(job_id = id, error = %e, "cannot record status change"),
                    }
                }
                PollOutcome::StillPending(status)
            }
            JobStatus::Failed => {
                tracing::warn!(job_id = id, "job failed on server");
                self.forget(id);
                PollOutcome::Failed
            }
            _ => self.finish(id, job, status, &reply),
        }
    }

    /// Attach output, export, then drop the store entry whatever the export did.
    fn finish(&self, id: &str, mut job: JobDescriptor, status: JobStatus, reply: &StatusReply) -> PollOutcome {
        let output = reply.job_output().unwrap_or_default();
        if let Err(e) = job.complete(status, output) {
            tracing::warn!(job_id = id, error = %e, "cannot attach output");
            return PollOutcome::Skipped(StoreError::from(e));
        }
        let outcome = match self.exporter.export(&job) {
            Ok(artifacts) => PollOutcome::Exported {
                job: Box::new(job),
                artifacts,
                json_size: reply.json_size(),
            },
            Err(e) => {
                tracing::error!(job_id = id, error = %e, "export failed");
                PollOutcome::ExportFailed(e)
            }
        };
        self.forget(id);
        outcome
    }

    fn forget(&self, id: &str) {
        if let Err(e) = self.store.delete(id) {
            tracing::warn!(job_id = id, error = %e, "cannot remove job from store");
        }
    }
}

/// Sleep for `d` unless a stop is requested first. Returns true when stopped.
async fn pause(d: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    let deadline = Instant::now() + d;
    loop {
        if *stop.borrow_and_update() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return false,
            changed = stop.changed() => {
                if changed.is_err() {
                    return true;
                }
            }
        }
    }
}
