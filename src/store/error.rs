// Config store errors

use std::path::PathBuf;

use thiserror::Error;

/// Failures inside the configuration store.
///
/// A missing record is not an error: loaders return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup path {0} does not exist")]
    BackupMissing(PathBuf),

    #[error("backup path {backup} overlaps config directory {config_dir}")]
    Overlapping { backup: PathBuf, config_dir: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
