use roadmap_core::{RoadmapError, RoadmapResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Atomic file writer that prevents data corruption
/// Uses write-to-temp-file → atomic-rename pattern for safety
pub struct AtomicWriter;

impl AtomicWriter {
    /// Write data to a file atomically
    ///
    /// The temp file lives in the target's directory so the rename stays on
    /// one filesystem. A crash mid-write leaves the old file untouched.
    pub async fn write_atomic(path: &Path, data: &[u8]) -> RoadmapResult<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).await?;

        let temp_file = tempfile::NamedTempFile::new_in(parent)?;
        let temp_path = temp_file.into_temp_path();

        fs::write(&temp_path, data).await?;
        fs::rename(&temp_path, path).await?;

        tracing::debug!(
            "Atomically wrote {} bytes to {}",
            data.len(),
            path.display()
        );
        Ok(())
    }

    /// Serialize a value as pretty JSON and write it atomically
    pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> RoadmapResult<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| RoadmapError::Serialization(e.to_string()))?;
        Self::write_atomic(path, &bytes).await
    }

    /// Read and parse a JSON file; `None` when the file does not exist yet
    pub async fn read_json<T: DeserializeOwned>(path: &Path) -> RoadmapResult<Option<T>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| RoadmapError::Serialization(format!("{}: {}", path.display(), e)))
    }
}
