//! Batch mode: submit structures across a parameter sweep, poll until the
//! store drains, and record per-job timing statistics.
//!
//! The default sweep varies `probe_out` over 4, 6 and 8 Å, then
//! `removal_distance` over 0, 0.6, 1.2 and 2.4 Å, each time keeping the other
//! parameters at their defaults.

mod atoms;
mod stats;

pub use atoms::{AtomCounter, PdbAtomCounter};
pub use stats::{StatsFile, TimingRow, STATS_HEADER};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use crate::export::ResultExporter;
use crate::job::{JobDescriptor, DEFAULT_BASE_NAME};
use crate::poller::{PollConfig, PollOutcome, Poller};
use crate::settings::{Settings, SettingsError};
use crate::submit::{SubmitOutcome, Submitter};

const DEFAULT_PROBE_OUTS: [f64; 3] = [4.0, 6.0, 8.0];
const DEFAULT_REMOVAL_DISTANCES: [f64; 4] = [0.0, 0.6, 1.2, 2.4];

/// One sweep point: values overriding the base settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepPoint {
    pub probe_out: Option<f64>,
    pub removal_distance: Option<f64>,
}

impl SweepPoint {
    pub fn apply(&self, base: &Settings) -> Result<Settings, SettingsError> {
        let mut b = base.to_builder();
        if let Some(po) = self.probe_out {
            b = b.probe_out(po);
        }
        if let Some(rd) = self.removal_distance {
            b = b.removal_distance(rd);
        }
        b.build()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    points: Vec<SweepPoint>,
}

impl Sweep {
    pub fn new(points: Vec<SweepPoint>) -> Self {
        Self { points }
    }

    /// A single run with the base settings.
    pub fn single() -> Self {
        Self::new(vec![SweepPoint::default()])
    }

    /// One point per probe_out value, then one per removal_distance value.
    pub fn from_axes(probe_outs: &[f64], removal_distances: &[f64]) -> Self {
        let po = probe_outs.iter().map(|&v| SweepPoint {
            probe_out: Some(v),
            removal_distance: None,
        });
        let rd = removal_distances.iter().map(|&v| SweepPoint {
            probe_out: None,
            removal_distance: Some(v),
        });
        Self::new(po.chain(rd).collect())
    }

    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Self::from_axes(&DEFAULT_PROBE_OUTS, &DEFAULT_REMOVAL_DISTANCES)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Artifacts go to `<output_directory>/<id>/`.
    pub output_directory: PathBuf,
    pub base_settings: Settings,
    /// Recorded in every statistics row (number of server workers).
    pub n_workers: u32,
    /// `idle_cycles_to_stop` defaults to 1 when unset.
    pub poll: PollConfig,
}

/// Counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub submitted: usize,
    pub submit_failed: usize,
    /// The server already had a finished job for the same input.
    pub already_finished: usize,
    pub exported: usize,
    pub export_failed: usize,
    /// Failed on the server or unknown to it.
    pub lost: usize,
    pub rows_written: usize,
    pub cycles: u64,
}

pub struct BatchRunner {
    submitter: Submitter,
    exporter: ResultExporter,
    atoms: Arc<dyn AtomCounter>,
    stats: StatsFile,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(
        submitter: Submitter,
        exporter: ResultExporter,
        atoms: Arc<dyn AtomCounter>,
        stats: StatsFile,
        options: BatchOptions,
    ) -> Self {
        Self {
            submitter,
            exporter,
            atoms,
            stats,
            options,
        }
    }

    /// Submit every (structure, point) pair, then poll until the store is idle.
    pub async fn run(&self, structures: &[PathBuf], sweep: &Sweep) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut ids = HashSet::new();

        for pdb in structures {
            for point in sweep.points() {
                let settings = point
                    .apply(&self.options.base_settings)
                    .with_context(|| format!("invalid sweep point {:?}", point))?;
                match self.submit_one(pdb, settings).await {
                    Ok(SubmitOutcome::Queued(id)) | Ok(SubmitOutcome::AlreadyPending(id)) => {
                        summary.submitted += 1;
                        ids.insert(id);
                    }
                    Ok(SubmitOutcome::AlreadyFinished { id, status }) => {
                        tracing::info!(job_id = %id, %status, "already finished on server, not timed");
                        summary.already_finished += 1;
                    }
                    Err(e) => {
                        tracing::warn!(path = %pdb.display(), error = %e, "submission failed, skipping");
                        summary.submit_failed += 1;
                    }
                }
            }
        }
        tracing::info!(submitted = summary.submitted, failed = summary.submit_failed, "batch submitted");

        let mut config = self.options.poll.clone();
        config.idle_cycles_to_stop = Some(config.idle_cycles_to_stop.unwrap_or(1).max(1));
        let poller = Poller::new(
            self.submitter.store().clone(),
            Arc::clone(self.submitter.remote()),
            self.exporter.clone(),
            config,
        );
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut finished = Vec::new();
        let cycles = poller
            .run(stop_rx, |report| {
                // Jobs left in the store by earlier runs are exported too, but
                // are not part of this batch.
                for entry in report.entries.into_iter().filter(|e| ids.contains(&e.id)) {
                    match entry.outcome {
                        PollOutcome::Exported { job, json_size, .. } => {
                            summary.exported += 1;
                            finished.push((*job, json_size));
                        }
                        PollOutcome::ExportFailed(_) => summary.export_failed += 1,
                        PollOutcome::Failed | PollOutcome::Vanished => summary.lost += 1,
                        _ => {}
                    }
                }
            })
            .await;
        summary.cycles = cycles;
        summary.rows_written = self.record(finished).await?;

        tracing::info!(
            exported = summary.exported,
            rows = summary.rows_written,
            path = %self.stats.path().display(),
            "batch finished"
        );
        Ok(summary)
    }

    async fn submit_one(&self, pdb: &Path, settings: Settings) -> Result<SubmitOutcome> {
        let base_name = pdb
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string());
        let mut job = JobDescriptor::new(pdb, &self.options.output_directory, base_name, settings);
        let submitter = self.submitter.clone();
        let exporter = self.exporter.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let outcome = submitter.submit(&mut job)?;
            if job.output().is_some() {
                exporter.export(&job)?;
            }
            anyhow::Ok(outcome)
        })
        .await
        .context("submit task join")??;
        Ok(outcome)
    }

    /// Append one statistics row per exported job, off the async runtime.
    /// Jobs whose row cannot be produced are logged and skipped. Returns the
    /// number of rows written.
    async fn record(&self, finished: Vec<(JobDescriptor, usize)>) -> Result<usize> {
        let atoms = Arc::clone(&self.atoms);
        let stats = self.stats.clone();
        let n_workers = self.options.n_workers;
        let written = tokio::task::spawn_blocking(move || {
            let mut written = 0;
            for (job, json_size) in &finished {
                let appended = timing_row(atoms.as_ref(), n_workers, job, *json_size)
                    .and_then(|row| stats.append(&row).map_err(anyhow::Error::from));
                match appended {
                    Ok(()) => written += 1,
                    Err(e) => {
                        tracing::warn!(job_id = job.id().unwrap_or_default(), error = %e, "no statistics row")
                    }
                }
            }
            written
        })
        .await
        .context("statistics task join")?;
        Ok(written)
    }
}

fn timing_row(atoms: &dyn AtomCounter, n_workers: u32, job: &JobDescriptor, json_size: usize) -> Result<TimingRow> {
    let timings = job
        .output()
        .context("exported job without output")?
        .timings()?;
    let n_atoms = atoms
        .count_atoms(&job.pdb_path)
        .with_context(|| format!("count atoms in {}", job.pdb_path.display()))?;
    Ok(TimingRow {
        pdb: job.pdb_path.clone(),
        id: job.id().unwrap_or_default().to_string(),
        n_atoms,
        timings,
        json_size,
        probe_out: job.settings.probe_out(),
        removal_distance: job.settings.removal_distance(),
        n_workers,
    })
}
