//! Reading font sources and writing results to disk.

use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A path that can't be written to at all.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PathError {
    /// The path doesn't end in a file name.
    NoFileName,
    /// The parent directory can't be inspected.
    NotFound,
    /// The parent exists but is not a directory.
    UnsupportedFileType,
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NoFileName => f.pad("path has no file name"),
            Self::NotFound => f.pad("parent directory not found"),
            Self::UnsupportedFileType => f.pad("parent is not a directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Write `bytes` to `path`, creating missing parent directories.
///
/// Returns `Ok(false)` if the directories can't be created or the write
/// fails, and an error if the path can never be written to. The data is
/// first written to a temporary file next to the target, so a failed write
/// leaves an existing file untouched.
pub fn write_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> Result<bool, PathError> {
    let path = path.as_ref();
    if path.file_name().is_none() {
        return Err(PathError::NoFileName);
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.exists() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            log::warn!("failed to create {}: {err}", parent.display());
            return Ok(false);
        }
    }

    let metadata = std::fs::metadata(parent).map_err(|_| PathError::NotFound)?;
    if !metadata.is_dir() {
        return Err(PathError::UnsupportedFileType);
    }

    let written = NamedTempFile::new_in(parent)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.flush()?;
            Ok(file)
        })
        .and_then(|file| file.persist(path).map_err(|err| err.error));

    match written {
        Ok(_) => Ok(true),
        Err(err) => {
            log::warn!("failed to write {}: {err}", path.display());
            Ok(false)
        }
    }
}

/// Read a font source. Unreadable and empty files yield `None`.
pub fn read_source(path: impl AsRef<Path>) -> Option<Vec<u8>> {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(data) if !data.is_empty() => Some(data),
        Ok(_) => {
            log::warn!("{} is empty", path.display());
            None
        }
        Err(err) => {
            log::warn!("failed to read {}: {err}", path.display());
            None
        }
    }
}
