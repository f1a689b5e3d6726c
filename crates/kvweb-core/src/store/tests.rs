use super::*;
use crate::job::JobStatus;
use crate::settings::Settings;

fn submitted(id: &str) -> JobDescriptor {
    let settings = Settings::builder().probe_out(6.0).removal_distance(1.2).build().unwrap();
    let mut job = JobDescriptor::new("/data/1FMO.pdb", "/results", "1FMO", settings)
        .with_ligand("/data/ligand.pdb");
    job.mark_submitted(id, JobStatus::Queued).unwrap();
    job
}

#[test]
fn save_then_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path().join("jobs"));
    let job = submitted("16003184924428484398");
    store.save(&job).unwrap();

    let path = dir.path().join("jobs/16003184924428484398").join(JOB_FILE_NAME);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# TOML configuration file for KVFinder-web job"));

    let loaded = store.load("16003184924428484398").unwrap();
    assert_eq!(loaded.id(), job.id());
    assert_eq!(loaded.status(), JobStatus::Queued);
    assert_eq!(loaded.pdb_path, job.pdb_path);
    assert_eq!(loaded.ligand_path, job.ligand_path);
    assert_eq!(loaded.base_name, "1FMO");
    assert_eq!(loaded.settings, job.settings);
    assert!(!loaded.id_added_manually());
}

#[test]
fn save_overwrites_status() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let mut job = submitted("a1");
    store.save(&job).unwrap();
    job.refresh_status(JobStatus::Running).unwrap();
    store.save(&job).unwrap();
    assert_eq!(store.load("a1").unwrap().status(), JobStatus::Running);
}

#[test]
fn manual_flag_survives() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let job = JobDescriptor::reattach("m1", "/data/a.pdb", "/out", "a", Settings::default()).unwrap();
    store.save(&job).unwrap();
    assert!(store.load("m1").unwrap().id_added_manually());
}

#[test]
fn unsubmitted_job_cannot_be_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let job = JobDescriptor::new("/data/a.pdb", "/out", "a", Settings::default());
    assert!(matches!(store.save(&job), Err(StoreError::Job(JobError::MissingId))));
    assert!(store.list_ids().unwrap().is_empty());
}

#[test]
fn missing_root_lists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path().join("never-created"));
    assert!(store.list_ids().unwrap().is_empty());
}

#[test]
fn list_ids_skips_plain_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    store.save(&submitted("b")).unwrap();
    store.save(&submitted("a")).unwrap();
    fs::write(dir.path().join("stray.txt"), b"x").unwrap();
    let ids: Vec<_> = store.list_ids().unwrap().into_iter().collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn load_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    assert!(matches!(store.load("nope"), Err(StoreError::NotFound(id)) if id == "nope"));
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    fs::create_dir_all(dir.path().join("bad")).unwrap();
    fs::write(dir.path().join("bad").join(JOB_FILE_NAME), "status = [[[").unwrap();
    assert!(matches!(
        store.load("bad"),
        Err(StoreError::CorruptData { id, .. }) if id == "bad"
    ));
}

#[test]
fn terminal_status_on_disk_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    store.save(&submitted("t")).unwrap();
    let path = dir.path().join("t").join(JOB_FILE_NAME);
    let text = fs::read_to_string(&path).unwrap().replace("status = \"queued\"", "status = \"completed\"");
    fs::write(&path, text).unwrap();
    assert!(matches!(store.load("t"), Err(StoreError::CorruptData { .. })));
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    store.save(&submitted("gone")).unwrap();
    store.delete("gone").unwrap();
    assert!(!dir.path().join("gone").exists());
    store.delete("gone").unwrap();
    assert!(store.list_ids().unwrap().is_empty());
}

#[test]
fn ids_that_escape_root_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = JobStore::new(dir.path());
    for id in ["", ".", "..", "a/b", "..\\x"] {
        assert!(matches!(store.delete(id), Err(StoreError::InvalidId(_))), "{id:?}");
    }
}

#[cfg(unix)]
#[test]
fn unwritable_root_is_storage_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("ro");
    fs::create_dir(&root).unwrap();
    fs::set_permissions(&root, fs::Permissions::from_mode(0o500)).unwrap();
    // Root ignores permission bits.
    if fs::write(root.join("probe"), b"x").is_ok() {
        return;
    }
    let store = JobStore::new(&root);
    assert!(matches!(store.save(&submitted("x")), Err(StoreError::Storage(_))));
    fs::set_permissions(&root, fs::Permissions::from_mode(0o700)).unwrap();
}
