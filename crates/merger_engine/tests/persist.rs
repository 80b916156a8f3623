use std::fs;

use merger_engine::{prepare_output_dir, ArtifactWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out").join("nested");
    prepare_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
    // Second call on an existing directory is fine.
    prepare_output_dir(&new_dir).unwrap();
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("occupied");
    fs::write(&file_path, "x").unwrap();
    assert!(matches!(
        prepare_output_dir(&file_path),
        Err(PersistError::NotADirectory { .. })
    ));
}

#[test]
fn write_replaces_existing_file_and_leaves_no_partials() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path());

    let first = writer.write("merged.mp4", b"\x00one").unwrap();
    assert_eq!(first.file_name().unwrap(), "merged.mp4");
    assert_eq!(fs::read(&first).unwrap(), b"\x00one");

    let second = writer.write("merged.mp4", b"\x00two").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"\x00two");

    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["merged.mp4"]);
}

#[test]
fn nested_or_parent_filenames_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(temp.path().join("out"));

    for name in ["../escape.mp4", "sub/merged.mp4", "", ".."] {
        assert!(
            matches!(writer.write(name, b"x"), Err(PersistError::InvalidFilename { .. })),
            "{name:?} should be rejected"
        );
    }
    assert!(!temp.path().join("out").exists());
    assert!(!temp.path().join("escape.mp4").exists());
}

#[test]
fn no_output_when_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = ArtifactWriter::new(&file_path);
    assert!(writer.write("merged.mp4", b"data").is_err());
    assert!(!temp.path().join("merged.mp4").exists());
}
