//! Local byte source and sink.

use crate::error::{TransportError, TransportResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Fails with `NotFound` for the first path that does not exist.
pub fn require_files(paths: &[&Path]) -> TransportResult<()> {
    match paths.iter().find(|p| !p.is_file()) {
        Some(missing) => Err(TransportError::NotFound(missing.to_path_buf())),
        None => Ok(()),
    }
}

/// Reads a whole file, refusing anything larger than `limit` bytes.
pub fn read_bounded(path: &Path, limit: u64, what: &'static str) -> TransportResult<Vec<u8>> {
    let size = fs::metadata(path)
        .map_err(|e| TransportError::io(path, e))?
        .len();
    if size > limit {
        return Err(TransportError::TooLarge { what, size, limit });
    }
    fs::read(path).map_err(|e| TransportError::io(path, e))
}

/// Writes `bytes` to a uniquely named temp file in the same directory and
/// renames it over `path`, so readers see either the old contents or the new,
/// never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> TransportResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| TransportError::io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| TransportError::io(path, e))?;
    tmp.persist(path).map_err(|e| TransportError::io(path, e.error))?;
    debug!(path = %path.display(), len = bytes.len(), "wrote file");
    Ok(())
}
