use std::sync::Arc;

use tempfile::TempDir;

use crate::engine::core::sink::{DirWriter, MultiWriter, Writer};

#[test]
fn dir_writer_creates_nested_paths() {
    let dir = TempDir::new().unwrap();
    let writer = DirWriter::new(dir.path()).unwrap();

    writer
        .write("2024-01-02/tenant-1-12345.parquet", b"payload")
        .unwrap();

    let written = dir.path().join("2024-01-02/tenant-1-12345.parquet");
    assert_eq!(b"payload".to_vec(), std::fs::read(written).unwrap());
}

#[test]
fn dir_writer_keeps_names_inside_the_root() {
    let dir = TempDir::new().unwrap();
    let writer = DirWriter::new(dir.path()).unwrap();

    writer.write("../escape.parquet", b"x").unwrap();
    assert!(dir.path().join("escape.parquet").exists());
    assert!(!dir.path().parent().unwrap().join("escape.parquet").exists());
}

#[test]
fn multi_writer_fans_out_to_every_sink() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let multi = MultiWriter::new(vec![
        Arc::new(DirWriter::new(a.path()).unwrap()),
        Arc::new(DirWriter::new(b.path()).unwrap()),
    ]);

    multi.write("file.parquet", b"payload").unwrap();
    assert!(a.path().join("file.parquet").exists());
    assert!(b.path().join("file.parquet").exists());
}
