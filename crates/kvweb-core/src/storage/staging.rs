//! Multi-file staging: write every file to its temp path, then rename them all.

use std::fs;
use std::path::{Path, PathBuf};

use super::{write_temp, StorageError};

/// A set of files written to `.part` paths and committed together.
///
/// If any stage or rename fails, everything this staging wrote (temp files
/// and files already renamed into place) is removed before the error is
/// returned. Dropping an uncommitted staging removes its temp files.
#[derive(Debug, Default)]
pub struct Staging {
    staged: Vec<(PathBuf, PathBuf)>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `contents` to the temp path of `final_path`.
    pub fn stage(&mut self, final_path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        match write_temp(final_path, contents) {
            Ok(tmp) => {
                self.staged.push((tmp, final_path.to_path_buf()));
                Ok(())
            }
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }

    /// Number of files staged so far.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Rename every staged file into place, in staging order. Returns the final paths.
    pub fn commit(mut self) -> Result<Vec<PathBuf>, StorageError> {
        let staged = std::mem::take(&mut self.staged);
        let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (i, (tmp, final_path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, final_path) {
                tracing::warn!(path = %final_path.display(), "commit failed, rolling back {} file(s)", committed.len());
                for done in &committed {
                    let _ = fs::remove_file(done);
                }
                for (rest, _) in &staged[i..] {
                    let _ = fs::remove_file(rest);
                }
                return Err(StorageError::new("rename", final_path, e));
            }
            committed.push(final_path.clone());
        }
        Ok(committed)
    }

    fn discard(&mut self) {
        for (tmp, _) in self.staged.drain(..) {
            let _ = fs::remove_file(&tmp);
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        self.discard();
    }
}
