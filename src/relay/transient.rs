//! Scoped transient files bridging download and upload

use crate::media::sanitize_file_name;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A uniquely named local file that is deleted when released or dropped.
///
/// Prefer [`TransientFile::release`]; the `Drop` fallback covers early
/// returns, panics and cancelled futures.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    released: bool,
}

impl TransientFile {
    /// Create an empty file named `{uuid}_{file_name}` inside `dir`.
    ///
    /// Returns the guard together with a writable handle.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub async fn create(dir: &Path, file_name: &str) -> std::io::Result<(Self, tokio::fs::File)> {
        let unique = Uuid::new_v4().as_simple().to_string();
        let path = dir.join(format!("{unique}_{}", sanitize_file_name(file_name)));

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "Created transient file");
        Ok((
            Self {
                path,
                released: false,
            },
            file,
        ))
    }

    /// Location of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now.
    ///
    /// A file that is already gone counts as released.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be removed.
    pub async fn release(mut self) -> std::io::Result<()> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove transient file");
            }
        }
    }
}
