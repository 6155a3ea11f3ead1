use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Gallery keeps only the most recent enhancements.
const MAX_GALLERY_ITEMS: usize = 12;

/// One persisted enhancement, newest first in the gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub id: Uuid,
    pub image_url: String,
    pub file_name: String,
    pub enhanced_at: DateTime<Utc>,
}

/// JSON-file-backed history of enhanced images.
pub struct GalleryStore {
    path: PathBuf,
    entries: Mutex<Vec<GalleryEntry>>,
}

impl GalleryStore {
    /// Open the store, reading any existing gallery file. A missing file is
    /// an empty gallery; a corrupt one is discarded with a warning.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt gallery file");
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(HistoryError::Io(e)),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Prepend a new entry, dropping the oldest past the cap. Re-adding the
    /// URL already at the head is a no-op (double submit of the same result).
    pub async fn add(
        &self,
        image_url: &str,
        file_name: &str,
    ) -> Result<Option<GalleryEntry>, HistoryError> {
        let mut entries = self.entries.lock().await;
        if entries.first().map(|e| e.image_url.as_str()) == Some(image_url) {
            return Ok(None);
        }

        let entry = GalleryEntry {
            id: Uuid::new_v4(),
            image_url: image_url.to_string(),
            file_name: file_name.to_string(),
            enhanced_at: Utc::now(),
        };
        entries.insert(0, entry.clone());
        entries.truncate(MAX_GALLERY_ITEMS);
        self.persist(&entries).await?;
        Ok(Some(entry))
    }

    pub async fn list(&self) -> Vec<GalleryEntry> {
        self.entries.lock().await.clone()
    }

    /// Remove one entry by id. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> Result<bool, HistoryError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            self.persist(&entries).await?;
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<(), HistoryError> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await
    }

    async fn persist(&self, entries: &[GalleryEntry]) -> Result<(), HistoryError> {
        let raw = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("gallery file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("gallery serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_list_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::load(dir.path().join("gallery.json"))
            .await
            .unwrap();

        let entry = store
            .add("https://cdn.example/a.png", "photo.jpg")
            .await
            .unwrap()
            .expect("entry added");
        assert_eq!(store.list().await.len(), 1);

        assert!(store.remove(entry.id).await.unwrap());
        assert!(store.list().await.is_empty());
        assert!(!store.remove(entry.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_head_url_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::load(dir.path().join("gallery.json"))
            .await
            .unwrap();

        store.add("https://cdn.example/a.png", "a.jpg").await.unwrap();
        let dup = store.add("https://cdn.example/a.png", "a.jpg").await.unwrap();
        assert!(dup.is_none());
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn gallery_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::load(dir.path().join("gallery.json"))
            .await
            .unwrap();

        for i in 0..20 {
            store
                .add(&format!("https://cdn.example/{i}.png"), "x.jpg")
                .await
                .unwrap();
        }
        let entries = store.list().await;
        assert_eq!(entries.len(), MAX_GALLERY_ITEMS);
        // Newest first.
        assert_eq!(entries[0].image_url, "https://cdn.example/19.png");
    }

    #[tokio::test]
    async fn survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");

        {
            let store = GalleryStore::load(path.clone()).await.unwrap();
            store.add("https://cdn.example/a.png", "a.jpg").await.unwrap();
        }

        let reloaded = GalleryStore::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await.len(), 1);
    }
}
