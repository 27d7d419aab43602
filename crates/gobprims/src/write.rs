use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use gobprims_serde::{Encoder, GobError};
use serde::Serialize;

use crate::record::sample;

/// Where `gobprims write` puts the sample record unless told otherwise.
pub const DEFAULT_OUTPUT: &str = "/tmp/out.bin";

/// Errors from writing an encoded record to a file.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The output file could not be created.
    #[error("failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The record could not be encoded or written.
    #[error("failed to encode record: {0}")]
    Encode(#[from] GobError),

    /// Buffered output could not be handed back to the file.
    #[error("failed to close {}: {source}", .path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Encode `value` as a fresh stream into the file at `path`.
///
/// The file is created (or truncated) first; if that fails nothing is
/// written. It is closed before this returns, whatever the outcome.
pub fn write_record<T: ?Sized + Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), WriteError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| WriteError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    let mut encoder = Encoder::new(BufWriter::new(file));
    encoder.encode(value)?;

    // Every message is flushed as it is written; the file itself is closed
    // when it drops here.
    encoder
        .into_inner()
        .into_inner()
        .map_err(|err| WriteError::Close {
            path: path.to_path_buf(),
            source: err.into_error(),
        })?;
    tracing::debug!(path = %path.display(), "record written");
    Ok(())
}

/// Write the [`sample`] record to `path`.
pub fn write_sample(path: impl AsRef<Path>) -> Result<(), WriteError> {
    write_record(path, &sample())
}
