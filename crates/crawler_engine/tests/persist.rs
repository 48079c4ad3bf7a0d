use std::fs;

use crawler_engine::{append_line, ensure_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_directories_and_tolerates_existing_ones() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("2023").join("07");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
    ensure_dir(&new_dir).unwrap();
}

#[test]
fn atomic_write_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("2021-04-14.csv.gz", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "2021-04-14.csv.gz");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("2021-04-14.csv.gz", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("blob.bin", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("blob.bin").exists());
}

#[test]
fn append_line_keeps_previous_lines() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("2023").join("07").join("2023_07_15.jsonl");

    append_line(&path, "{\"a\":1}").unwrap();
    append_line(&path, "{\"b\":2}\n").unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"a\":1}\n{\"b\":2}\n"
    );
}
