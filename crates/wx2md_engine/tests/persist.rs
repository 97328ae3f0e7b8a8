use std::fs;

use wx2md_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_and_is_atomic() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("doc.md", "hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.md");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("doc.md", "world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.md", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("doc.md").exists());
}

#[test]
fn file_in_place_of_dir_is_reported() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("taken");
    fs::write(&file_path, "x").unwrap();
    assert!(matches!(
        ensure_output_dir(&file_path),
        Err(PersistError::OutputDir(_))
    ));
}

#[test]
fn binary_payloads_are_written_verbatim() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("images"));
    let bytes = [0x89, b'P', b'N', b'G', 0, 255];
    let path = writer.write_bytes("image_1_000_abc123.png", &bytes).unwrap();
    assert_eq!(fs::read(path).unwrap(), bytes);
}
