//! Tab-separated timing statistics, one row per exported job.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::job::JobTimings;
use crate::storage::StorageError;

pub const STATS_HEADER: &str = "pdb\tid\tn_atoms\ttotal_time\tqueued_time\tworker_time\tjson_size\tprobe_out\tremoval_distance\tn_workers\n";

#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    pub pdb: PathBuf,
    pub id: String,
    pub n_atoms: usize,
    pub timings: JobTimings,
    pub json_size: usize,
    pub probe_out: f64,
    pub removal_distance: f64,
    pub n_workers: u32,
}

impl TimingRow {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{}\t{:?}\t{:?}\t{}\n",
            self.pdb.display(),
            self.id,
            self.n_atoms,
            self.timings.total.as_secs_f64(),
            self.timings.queued.as_secs_f64(),
            self.timings.worker.as_secs_f64(),
            self.json_size,
            self.probe_out,
            self.removal_distance,
            self.n_workers,
        )
    }
}

/// Append-only statistics file. The header is written once, when the file
/// is created (or found empty).
#[derive(Debug, Clone)]
pub struct StatsFile {
    path: PathBuf,
}

impl StatsFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            crate::storage::ensure_dir(parent)?;
        }
        let is_empty = match fs::metadata(&path) {
            Ok(m) => m.len() == 0,
            Err(_) => true,
        };
        if is_empty {
            fs::write(&path, STATS_HEADER).map_err(|e| StorageError::new("write", &path, e))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &TimingRow) -> Result<(), StorageError> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::new("open", &self.path, e))?;
        f.write_all(row.to_line().as_bytes())
            .map_err(|e| StorageError::new("append", &self.path, e))
    }
}
