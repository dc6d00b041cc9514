//! Local media staging for uploads
//!
//! The selected file is copied into the media cache directory before being
//! streamed to the server. The copy lives exactly as long as its
//! `CachedMedia` guard.

use crate::core::ChatError;
use crate::dtos::MediaKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct CachedMedia {
    path: PathBuf,
    len: u64,
}

impl CachedMedia {
    /// Copies `source` into `cache_dir` under a unique name
    pub async fn stage(cache_dir: &Path, source: &Path, kind: MediaKind) -> Result<Self, ChatError> {
        tokio::fs::create_dir_all(cache_dir)
            .await
            .map_err(|e| ChatError::media(format!("Unable to prepare media cache: {e}")))?;

        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(match kind {
                MediaKind::Image => "jpg",
                MediaKind::Video => "mp4",
            });
        let path = cache_dir.join(format!("{}-{}.{}", kind.part_name(), Uuid::new_v4(), extension));

        // guard first, so a partial copy is removed as well
        let mut staged = Self { path, len: 0 };
        staged.len = tokio::fs::copy(source, &staged.path)
            .await
            .map_err(|e| ChatError::media(format!("Unable to read {}: {e}", kind.part_name())))?;
        debug!(path = %staged.path.display(), size = staged.len, "Media staged");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for CachedMedia {
    // blocking unlink of one small file, so cleanup also runs on panic or cancellation
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Staged media removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove staged media: {}", e),
        }
    }
}
