use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Fixed logical folder all report photos land under.
const REPORTS_FOLDER: &str = "infrastructure-reports";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to store object: {0}")]
    Storage(String),
}

/// Disk-backed media store. Accepts raw bytes and hands back the durable
/// public URL the stored object is served under.
pub struct MediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl MediaStore {
    #[must_use]
    pub fn new(media_path: &str, public_base_url: &str) -> Self {
        Self {
            root: PathBuf::from(media_path),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Root directory handed to the static file layer.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Writes the object and returns its public URL. The write must
    /// complete before any database row references the URL.
    pub async fn store_report_image(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, MediaError> {
        let extension = extension_for(content_type);
        let filename = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.root.join(REPORTS_FOLDER);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        let path = dir.join(&filename);
        fs::write(&path, bytes)
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        info!(path = %path.display(), size = bytes.len(), "Stored report image");

        Ok(format!(
            "{}/media/{}/{}",
            self.public_base_url, REPORTS_FOLDER, filename
        ))
    }
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        Some(other) => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.last())
            .copied()
            .unwrap_or("jpg"),
        None => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("image/webp")), "webp");
        assert_eq!(extension_for(None), "jpg");
        assert_eq!(extension_for(Some("application/unknown-blob")), "jpg");
    }

    #[tokio::test]
    async fn test_store_returns_public_url_and_writes_file() {
        let dir = std::env::temp_dir().join(format!("civicwatch-media-{}", Uuid::new_v4()));
        let store = MediaStore::new(dir.to_str().unwrap(), "http://localhost:3000/");

        let url = store
            .store_report_image(b"not really a jpeg", Some("image/jpeg"))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:3000/media/infrastructure-reports/"));

        let filename = url.rsplit('/').next().unwrap();
        let on_disk = dir.join(REPORTS_FOLDER).join(filename);
        assert!(on_disk.exists());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
