use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result};

use super::{Frame, FrameSource};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Replays still images from a directory, one per capture, wrapping around.
///
/// Files are ordered by name and re-listed on every capture, so snapshots
/// dropped into the directory by another process are picked up.
pub struct DirectoryFrameSource {
    dir: PathBuf,
    quality: u8,
    cursor: AtomicUsize,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            quality,
            cursor: AtomicUsize::new(0),
        }
    }

    async fn next_frame(&self) -> Result<Option<Frame>> {
        let files = list_images(&self.dir).await?;
        if files.is_empty() {
            return Ok(None);
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % files.len();
        let path = files[index].clone();
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let quality = self.quality;
        let frame = tokio::task::spawn_blocking(move || Frame::from_image_bytes(&bytes, quality))
            .await
            .context("frame decode worker join failed")?
            .with_context(|| format!("failed to decode {}", path.display()))?;

        log_debug!("captured {} ({} bytes)", path.display(), frame.jpeg_bytes().len());
        Ok(Some(frame))
    }
}

impl FrameSource for DirectoryFrameSource {
    async fn capture_frame(&self) -> Option<Frame> {
        match self.next_frame().await {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                log_warn!("no images in {}", self.dir.display());
                None
            }
            Err(err) => {
                log_warn!("directory capture failed: {err:#}");
                None
            }
        }
    }
}

async fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::test_png;
    use tempfile::TempDir;

    #[tokio::test]
    async fn cycles_through_images_in_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.png"), test_png(8, 8)).unwrap();
        std::fs::write(dir.path().join("a.png"), test_png(4, 2)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = DirectoryFrameSource::new(dir.path(), 70);

        let first = source.capture_frame().await.unwrap();
        let second = source.capture_frame().await.unwrap();
        let third = source.capture_frame().await.unwrap();

        assert_eq!(first.dimensions(), (4, 2));
        assert_eq!(second.dimensions(), (8, 8));
        assert_eq!(third.dimensions(), (4, 2));
    }

    #[tokio::test]
    async fn empty_directory_yields_none() {
        let dir = TempDir::new().unwrap();
        let source = DirectoryFrameSource::new(dir.path(), 70);
        assert!(source.capture_frame().await.is_none());
    }

    #[tokio::test]
    async fn missing_directory_yields_none() {
        let source = DirectoryFrameSource::new("/nonexistent/hawkwatch/frames", 70);
        assert!(source.capture_frame().await.is_none());
    }

    #[tokio::test]
    async fn undecodable_file_yields_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let source = DirectoryFrameSource::new(dir.path(), 70);
        assert!(source.capture_frame().await.is_none());
    }
}
