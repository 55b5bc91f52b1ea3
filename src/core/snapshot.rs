//! # Versioned State Snapshots
//!
//! JSON state files restored once at startup and removed after a successful
//! load. A file whose version or shape does not match is an error and is left
//! on disk untouched.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.6.0
//!
//! ## Changelog
//! - 2.0.0: Versioned envelope; mismatched snapshots fail instead of loading partially
//! - 1.0.0: Initial release with unversioned dumps

use crate::core::error::SnapshotError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk envelope around a snapshot payload
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    saved_at: DateTime<Utc>,
    payload: T,
}

/// Version header, read before the payload so a mismatch is reported as such
#[derive(Deserialize)]
struct VersionOnly {
    version: u32,
}

/// A snapshot file of one payload type at one schema version
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    version: u32,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, version: u32) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// Write the payload, replacing any previous snapshot
    pub fn save<T: Serialize>(&self, payload: &T) -> Result<(), SnapshotError> {
        let envelope = Envelope {
            version: self.version,
            saved_at: Utc::now(),
            payload,
        };
        let json = serde_json::to_vec_pretty(&envelope).map_err(|source| SnapshotError::Format {
            path: self.display(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))?;

        debug!("Saved snapshot {}", self.display());
        Ok(())
    }

    /// Restore the payload and remove the file.
    ///
    /// Returns `Ok(None)` when there is nothing to restore.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, SnapshotError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        let header: VersionOnly =
            serde_json::from_slice(&contents).map_err(|source| SnapshotError::Format {
                path: self.display(),
                source,
            })?;
        if header.version != self.version {
            return Err(SnapshotError::VersionMismatch {
                path: self.display(),
                expected: self.version,
                found: header.version,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&contents).map_err(|source| SnapshotError::Format {
                path: self.display(),
                source,
            })?;

        fs::remove_file(&self.path).map_err(|source| self.io_error(source))?;
        info!(
            "Restored snapshot {} saved at {}",
            self.display(),
            envelope.saved_at
        );
        Ok(Some(envelope.payload))
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.display(),
            source,
        }
    }
}
