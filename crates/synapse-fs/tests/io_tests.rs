use std::fs;

use synapse_fs::{Error, FileLock, NormalizedPath, io};
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("sessions").join("s1.json"));

    io::write_atomic(&path, b"{}").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("record.json"));

    io::write_atomic(&path, b"one").unwrap();
    io::write_atomic(&path, b"two").unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["record.json".to_string()]);
}

#[test]
fn test_read_text_if_exists_missing_is_none() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.txt"));
    assert!(io::read_text_if_exists(&path).unwrap().is_none());
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/file.txt");
    assert!(matches!(io::read_text(&path), Err(Error::Io { .. })));
}

#[test]
fn test_lock_fails_fast_when_held() {
    let temp = TempDir::new().unwrap();
    let target = NormalizedPath::new(temp.path().join("s1.json"));

    let held = FileLock::try_acquire(&target).unwrap();
    let second = FileLock::try_acquire(&target);
    assert!(matches!(second, Err(Error::LockContended { .. })));

    drop(held);
    assert!(FileLock::try_acquire(&target).is_ok());
}

#[test]
fn test_removed_lock_leaves_no_sidecar() {
    let temp = TempDir::new().unwrap();
    let target = NormalizedPath::new(temp.path().join("s1.json"));

    let lock = FileLock::try_acquire(&target).unwrap();
    let sidecar = lock.path().to_path_buf();
    assert!(sidecar.exists());

    lock.remove().unwrap();

    assert!(!sidecar.exists());
    assert!(FileLock::try_acquire(&target).is_ok());
}
