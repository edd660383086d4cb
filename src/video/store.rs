//! VideoStore - local directory holding fetched video payloads.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A locally dereferenceable reference to a stored video payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHandle {
    path: PathBuf,
    size: u64,
}

impl VideoHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// `file://` URI for players that want a URL rather than a path.
    pub fn file_uri(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

/// Content-addressed store for generated videos.
///
/// Files are named by a hash of their bytes, so storing the same payload
/// twice yields the same handle.
#[derive(Debug, Clone)]
pub struct VideoStore {
    dir: PathBuf,
}

impl VideoStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default: `~/.cache/storyreel/videos/`
    pub fn with_default_dir() -> Self {
        Self::new(default_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` into the store and return its handle.
    pub async fn store(&self, bytes: &[u8]) -> Result<VideoHandle, std::io::Error> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.mp4", Self::hash_bytes(bytes)));
        tokio::fs::write(&path, bytes).await?;
        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(VideoHandle {
            path,
            size: bytes.len() as u64,
        })
    }

    /// 32-character hex digest (first 16 bytes of SHA-256).
    pub fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }
}

/// Default store directory under the user cache dir.
pub fn default_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("storyreel")
        .join("videos")
}
