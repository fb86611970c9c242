use fontsmith::fs::{read_source, write_bytes, PathError};
use std::path::Path;

#[test]
fn test_write_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a/b/c/out.ttf");

    assert_eq!(write_bytes(&path, b"font"), Ok(true));
    assert_eq!(std::fs::read(&path).unwrap(), b"font");

    assert_eq!(write_bytes(&path, b"other"), Ok(true));
    assert_eq!(read_source(&path), Some(b"other".to_vec()));
}

#[test]
fn test_write_rejects_bad_paths() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file");
    std::fs::write(&file, b"x").unwrap();

    assert_eq!(write_bytes(file.join("out.ttf"), b"font"), Err(PathError::UnsupportedFileType));
    assert_eq!(write_bytes(Path::new("/"), b"font"), Err(PathError::NoFileName));
    assert_eq!(write_bytes(dir.path().join(".."), b"font"), Err(PathError::NoFileName));
}

#[test]
fn test_read_source() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.ttf");
    std::fs::write(&empty, b"").unwrap();

    assert_eq!(read_source(&empty), None);
    assert_eq!(read_source(dir.path().join("missing.ttf")), None);
    assert_eq!(read_source(dir.path()), None);
}
