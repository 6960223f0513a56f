//! File open and close for scoped file guards.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{FileOptions, OpenMode};

/// Open `path` for writing according to `options`.
pub fn open(path: &Path, options: &FileOptions) -> Result<BufWriter<File>> {
    let mut oo = OpenOptions::new();
    oo.create(true);
    match options.mode {
        OpenMode::Write => oo.write(true).truncate(true),
        OpenMode::Append => oo.append(true),
    };

    let file = oo.open(path).map_err(|source| Error::OpenFailure {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), mode = ?options.mode, "file opened");
    Ok(BufWriter::with_capacity(options.buffer_capacity, file))
}

/// Flush buffered data, optionally sync to disk, then close the file.
pub fn close(writer: BufWriter<File>, sync: bool) -> Result<()> {
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    if sync {
        file.sync_all()?;
    }
    drop(file);
    Ok(())
}
