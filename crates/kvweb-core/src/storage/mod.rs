//! Disk I/O helpers shared by the job store and the result exporter.
//!
//! Every file this crate produces is first written to a `.part` sibling and
//! then renamed into place, so a reader never observes a half-written file
//! under its final name.

mod staging;

pub use staging::Staging;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// I/O failure tagged with the operation and the path it touched.
#[derive(Debug, thiserror::Error)]
#[error("{op} {}: {source}", path.display())]
pub struct StorageError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StorageError {
    pub fn new(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Path for the temp file: appends `.part` to the final path (e.g. `job.toml` → `job.toml.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Write `contents` to `temp_path(path)`, sync it, and return the temp path.
pub(crate) fn write_temp(path: &Path, contents: &[u8]) -> Result<PathBuf, StorageError> {
    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp).map_err(|e| StorageError::new("create", &tmp, e))?;
    let written = file
        .write_all(contents)
        .map_err(|e| StorageError::new("write", &tmp, e))
        .and_then(|()| file.sync_all().map_err(|e| StorageError::new("sync", &tmp, e)));
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(tmp)
}

/// Write a single file atomically (temp file + rename).
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let tmp = write_temp(path, contents)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::new("rename", path, e));
    }
    Ok(())
}

/// Create `dir` and all missing parents; succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::new("create dir", dir, e))
}

/// Remove `dir` recursively. Missing directories are not an error.
pub fn remove_dir_if_exists(dir: &Path) -> Result<(), StorageError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::new("remove dir", dir, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("job.toml"));
        assert_eq!(p.to_string_lossy(), "job.toml.part");
        let p2 = temp_path(Path::new("/tmp/out/1FMO.KVFinder.output.pdb"));
        assert_eq!(p2.to_string_lossy(), "/tmp/out/1FMO.KVFinder.output.pdb.part");
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn write_atomic_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("job.toml");
        let err = write_atomic(&path, b"x").unwrap_err();
        assert_eq!(err.op, "create");
        assert!(!path.exists());
    }

    #[test]
    fn remove_dir_if_exists_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("abc").join("nested");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("f"), b"x").unwrap();
        remove_dir_if_exists(&dir.path().join("abc")).unwrap();
        assert!(!dir.path().join("abc").exists());
        remove_dir_if_exists(&dir.path().join("abc")).unwrap();
    }
}
