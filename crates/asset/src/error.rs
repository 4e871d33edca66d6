use std::{io, path::PathBuf};

use thiserror::Error;

/// Why the model could not be fetched. Every variant leaves the store
/// ready for another attempt.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {:#}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to start the loader thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("loader thread exited without a result")]
    WorkerLost,
}
