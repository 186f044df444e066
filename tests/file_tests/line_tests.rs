//! Tests for line reading and writing

use std::fs;

use flatkv::file::{self, WriteMode};
use tempfile::TempDir;

use crate::setup_store;

#[test]
fn test_reader_strips_terminators() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lines.dat");
    fs::write(&path, "a=1\r\nb=2\nc=3").unwrap();

    let lines: Vec<String> = file::open_reader(&path, false)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(lines, vec!["a=1", "b=2", "c=3"]);
}

#[test]
fn test_reader_skips_empty_lines() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lines.dat");
    fs::write(&path, "\n\na=1\n\r\n\nb=2\n\n").unwrap();

    let lines: Vec<String> = file::open_reader(&path, false)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(lines, vec!["a=1", "b=2"]);
}

#[test]
fn test_reader_creates_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fresh.dat");

    assert_eq!(file::open_reader(&path, false).unwrap().count(), 0);
    assert!(path.exists());
}

#[test]
fn test_writer_append_and_truncate() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out.dat");

    let mut writer = file::open_writer(&path, WriteMode::Append, false).unwrap();
    writer.write_line("a=1\n").unwrap();
    writer.finish().unwrap();

    let mut writer = file::open_writer(&path, WriteMode::Append, false).unwrap();
    writer.write_line("b=2\n").unwrap();
    writer.finish().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "a=1\nb=2\n");

    let mut writer = file::open_writer(&path, WriteMode::Truncate, false).unwrap();
    writer.write_line("c=3\n").unwrap();
    writer.finish().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "c=3\n");
}

#[test]
fn test_directory_at_store_path_is_rejected() {
    let (temp, store) = setup_store(false);
    let dir_path = temp.path().join("nested.dat");
    fs::create_dir(&dir_path).unwrap();

    assert!(file::ensure_file(&dir_path).is_err());
    assert!(flatkv::Store::open("nested", store.config()).is_err());
}

#[cfg(unix)]
#[test]
fn test_read_only_file_is_rejected() {
    let (_temp, store) = setup_store(false);
    let mut permissions = fs::metadata(store.path()).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(store.path(), permissions).unwrap();

    assert!(matches!(store.get("a"), Err(flatkv::FlatError::Io { .. })));
}
