//! Application context: one owned object wiring config, store, server
//! client, submitter, exporter and the background poller together.
//!
//! Callers create a context, use it, and shut it down; nothing here is
//! process-global, so several contexts (e.g. one per test) can coexist.

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::KvConfig;
use crate::export::{ExportedArtifacts, ResultExporter};
use crate::job::JobDescriptor;
use crate::poller::{CycleReport, PollConfig, Poller, PollerHandle};
use crate::remote::{HttpRemote, RemoteService};
use crate::store::JobStore;
use crate::submit::{SubmitError, SubmitOutcome, Submitter};

pub struct KvContext {
    config: KvConfig,
    store: JobStore,
    remote: Arc<dyn RemoteService>,
    submitter: Submitter,
    exporter: ResultExporter,
    poller: Option<PollerHandle>,
}

impl KvContext {
    /// Build a context talking to `config.server_url` over HTTP.
    pub fn from_config(config: KvConfig) -> Result<Self> {
        let remote = HttpRemote::new(&config.server_url, config.http_options())
            .with_context(|| format!("invalid server URL {:?}", config.server_url))?;
        let jobs_dir = config.jobs_dir()?;
        Ok(Self::with_remote(config, jobs_dir, Arc::new(remote)))
    }

    /// Build a context over any remote implementation and an explicit store root.
    pub fn with_remote(config: KvConfig, jobs_dir: PathBuf, remote: Arc<dyn RemoteService>) -> Self {
        let store = JobStore::new(jobs_dir);
        let submitter = Submitter::new(store.clone(), Arc::clone(&remote));
        Self {
            config,
            store,
            remote,
            submitter,
            exporter: ResultExporter::new(),
            poller: None,
        }
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn remote(&self) -> &Arc<dyn RemoteService> {
        &self.remote
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    pub fn exporter(&self) -> &ResultExporter {
        &self.exporter
    }

    /// Submit a job; if the server already finished it, export right away.
    pub fn submit(&self, job: &mut JobDescriptor) -> Result<(SubmitOutcome, Option<ExportedArtifacts>), SubmitError> {
        let outcome = self.submitter.submit(job)?;
        let artifacts = match job.output() {
            Some(_) => match self.exporter.export(job) {
                Ok(a) => Some(a),
                Err(e) => {
                    tracing::error!(job_id = outcome.id(), error = %e, "export of finished duplicate failed");
                    None
                }
            },
            None => None,
        };
        Ok((outcome, artifacts))
    }

    /// A poller over this context's store, using `config` pacing.
    pub fn poller(&self, config: PollConfig) -> Poller {
        Poller::new(
            self.store.clone(),
            Arc::clone(&self.remote),
            self.exporter.clone(),
            config,
        )
    }

    /// Start the background poller with the configured pacing. Does nothing
    /// if one is already running.
    pub fn start_polling(&mut self, reports: Option<mpsc::UnboundedSender<CycleReport>>) {
        if self.poller.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let poller = self.poller(self.config.poll_config());
        self.poller = Some(poller.spawn(reports));
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the background poller, if any, and wait for it.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(handle) = self.poller.take() {
            let cycles = handle.shutdown().await.context("poller task join")?;
            tracing::debug!(cycles, "poller shut down");
        }
        Ok(())
    }
}
