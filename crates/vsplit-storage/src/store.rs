//! Directory-per-video store.
//!
//! Layout under the data root:
//!
//! ```text
//! <root>/<video_id>/input.mp4
//! <root>/<video_id>/meta.json
//! <root>/<video_id>/segments_<mode>/part_NN.mp4
//! ```

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use vsplit_media::list_segment_files;
use vsplit_models::{SegmentOutput, VideoId, VideoMeta};

use crate::error::{StorageError, StorageResult};

/// Name of the stored source file.
pub const SOURCE_FILE: &str = "input.mp4";

/// Name of the metadata file.
pub const META_FILE: &str = "meta.json";

/// Prefix of per-mode segment directories.
pub const SEGMENTS_DIR_PREFIX: &str = "segments_";

/// Reject keys that could escape their parent directory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

/// Local filesystem store rooted at the data directory.
#[derive(Debug, Clone)]
pub struct VideoStore {
    root: PathBuf,
}

impl VideoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the data root if it does not exist yet.
    pub async fn ensure_root(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn video_dir(&self, video_id: &VideoId) -> StorageResult<PathBuf> {
        validate_key(video_id.as_str())?;
        Ok(self.root.join(video_id.as_str()))
    }

    /// Create the directory for a new upload.
    pub async fn create_video_dir(&self, video_id: &VideoId) -> StorageResult<PathBuf> {
        let dir = self.video_dir(video_id)?;
        fs::create_dir_all(&dir).await?;
        debug!("Created video directory {}", dir.display());
        Ok(dir)
    }

    pub fn source_path(&self, video_id: &VideoId) -> StorageResult<PathBuf> {
        Ok(self.video_dir(video_id)?.join(SOURCE_FILE))
    }

    /// Output directory for one processing mode.
    pub fn segments_dir(&self, video_id: &VideoId, mode: &str) -> StorageResult<PathBuf> {
        validate_key(mode)?;
        Ok(self
            .video_dir(video_id)?
            .join(format!("{}{}", SEGMENTS_DIR_PREFIX, mode)))
    }

    pub async fn write_meta(&self, meta: &VideoMeta) -> StorageResult<()> {
        let path = self.video_dir(&meta.video_id)?.join(META_FILE);
        let json = serde_json::to_vec_pretty(meta)?;
        fs::write(&path, json).await?;
        Ok(())
    }

    /// Read a video's metadata. A missing file is `NotFound`.
    pub async fn read_meta(&self, video_id: &VideoId) -> StorageResult<VideoMeta> {
        let path = self.video_dir(video_id)?.join(META_FILE);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(video_id.as_str()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All stored videos with readable metadata, newest first.
    pub async fn list_videos(&self) -> StorageResult<Vec<VideoMeta>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut videos = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            match self.read_meta(&VideoId::from_string(name.as_str())).await {
                Ok(meta) => videos.push(meta),
                Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {}
                Err(e) => warn!("Skipping video {}: {}", name, e),
            }
        }

        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    /// Segment outputs for a video, one per mode directory.
    ///
    /// With `mode` set only that directory is considered; a mode that was
    /// never split yields an empty list.
    pub async fn list_outputs(
        &self,
        video_id: &VideoId,
        mode: Option<&str>,
    ) -> StorageResult<Vec<SegmentOutput>> {
        let modes = match mode {
            Some(mode) => vec![mode.to_string()],
            None => self.list_modes(video_id).await?,
        };

        let mut outputs = Vec::with_capacity(modes.len());
        for mode in modes {
            let dir = self.segments_dir(video_id, &mode)?;
            if !fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
                continue;
            }
            let segments: Vec<String> = list_segment_files(&dir)
                .await?
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| segment_url(video_id, &mode, &name.to_string_lossy()))
                .collect();
            outputs.push(SegmentOutput {
                mode,
                parts: segments.len(),
                segments,
            });
        }
        Ok(outputs)
    }

    async fn list_modes(&self, video_id: &VideoId) -> StorageResult<Vec<String>> {
        let mut entries = fs::read_dir(self.video_dir(video_id)?).await?;
        let mut modes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(mode) = name.strip_prefix(SEGMENTS_DIR_PREFIX) {
                if validate_key(mode).is_ok() {
                    modes.push(mode.to_string());
                }
            }
        }
        modes.sort();
        Ok(modes)
    }

    /// Resolve a downloadable segment file.
    pub async fn segment_path(
        &self,
        video_id: &VideoId,
        mode: &str,
        filename: &str,
    ) -> StorageResult<PathBuf> {
        validate_key(filename)?;
        let path = self.segments_dir(video_id, mode)?.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::not_found(filename)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(filename))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove everything stored for a video.
    pub async fn remove_video_dir(&self, video_id: &VideoId) -> StorageResult<()> {
        let dir = self.video_dir(video_id)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!("Removed video directory {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn segment_url(video_id: &VideoId, mode: &str, filename: &str) -> String {
    format!("/segments/{}/{}/{}", video_id, mode, filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    async fn store_with_video(id: &str, owner: &str) -> (TempDir, VideoStore, VideoMeta) {
        let dir = TempDir::new().unwrap();
        let store = VideoStore::new(dir.path());
        let meta = VideoMeta::new(VideoId::from_string(id), owner, Some("clip.mp4".into()), 40.0);
        store.create_video_dir(&meta.video_id).await.unwrap();
        store.write_meta(&meta).await.unwrap();
        (dir, store, meta)
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("part_00.mp4").is_ok());
        assert!(validate_key("fast").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("../etc").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_meta_roundtrip_and_missing() {
        let (_dir, store, meta) = store_with_video("v1", "user").await;
        assert_eq!(store.read_meta(&meta.video_id).await.unwrap(), meta);

        let err = store.read_meta(&VideoId::from_string("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_videos_newest_first() {
        let (_dir, store, mut older) = store_with_video("old", "user").await;
        older.created_at = Utc::now() - Duration::hours(1);
        store.write_meta(&older).await.unwrap();

        let newer = VideoMeta::new(VideoId::from_string("new"), "admin", None, 5.0);
        store.create_video_dir(&newer.video_id).await.unwrap();
        store.write_meta(&newer).await.unwrap();

        // Directory without metadata is ignored
        store
            .create_video_dir(&VideoId::from_string("partial"))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list_videos()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.video_id.0)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_list_outputs() {
        let (_dir, store, meta) = store_with_video("v1", "user").await;
        let fast = store.segments_dir(&meta.video_id, "fast").unwrap();
        fs::create_dir_all(&fast).await.unwrap();
        for name in ["part_01.mp4", "part_00.mp4", "ffmpeg.log"] {
            fs::write(fast.join(name), b"x").await.unwrap();
        }
        fs::create_dir_all(store.segments_dir(&meta.video_id, "heavy").unwrap())
            .await
            .unwrap();

        let outputs = store.list_outputs(&meta.video_id, None).await.unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].mode, "fast");
        assert_eq!(outputs[0].parts, 2);
        assert_eq!(
            outputs[0].segments,
            vec!["/segments/v1/fast/part_00.mp4", "/segments/v1/fast/part_01.mp4"]
        );
        assert_eq!(outputs[1].mode, "heavy");
        assert_eq!(outputs[1].parts, 0);

        let only_fast = store.list_outputs(&meta.video_id, Some("fast")).await.unwrap();
        assert_eq!(only_fast.len(), 1);

        let never = store.list_outputs(&meta.video_id, Some("other")).await.unwrap();
        assert!(never.is_empty());
    }

    #[tokio::test]
    async fn test_segment_path() {
        let (_dir, store, meta) = store_with_video("v1", "user").await;
        let fast = store.segments_dir(&meta.video_id, "fast").unwrap();
        fs::create_dir_all(&fast).await.unwrap();
        fs::write(fast.join("part_00.mp4"), b"x").await.unwrap();

        let path = store
            .segment_path(&meta.video_id, "fast", "part_00.mp4")
            .await
            .unwrap();
        assert_eq!(path, fast.join("part_00.mp4"));

        let missing = store
            .segment_path(&meta.video_id, "fast", "part_09.mp4")
            .await
            .unwrap_err();
        assert!(missing.is_not_found());

        let traversal = store
            .segment_path(&meta.video_id, "fast", "../meta.json")
            .await
            .unwrap_err();
        assert!(matches!(traversal, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_remove_video_dir() {
        let (_dir, store, meta) = store_with_video("v1", "user").await;
        store.remove_video_dir(&meta.video_id).await.unwrap();
        assert!(!store.video_dir(&meta.video_id).unwrap().exists());
        // Removing twice is fine
        store.remove_video_dir(&meta.video_id).await.unwrap();
    }
}
