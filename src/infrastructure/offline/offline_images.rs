use crate::application::ports::offline_images::OfflineImageStore;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

const FILE_SCHEME: &str = "file://";

/// `<data_dir>/offline-images` へ画像をコピーする
#[derive(Debug, Clone)]
pub struct FileOfflineImageStore {
    dir: PathBuf,
}

impl FileOfflineImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn copy_into_store(&self, source: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let extension = normalize_extension(&source.to_string_lossy());
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let file_name = if extension.is_empty() {
            format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..10])
        } else {
            format!("{}-{}.{}", Utc::now().timestamp_millis(), &suffix[..10], extension)
        };
        let destination = self.dir.join(file_name);
        fs::copy(source, &destination).await?;
        Ok(destination)
    }
}

#[async_trait]
impl OfflineImageStore for FileOfflineImageStore {
    async fn persist(&self, uri: &str) -> String {
        if uri.is_empty() {
            return uri.to_string();
        }

        let had_scheme = uri.starts_with(FILE_SCHEME);
        let source = Path::new(uri.strip_prefix(FILE_SCHEME).unwrap_or(uri));
        if source.starts_with(&self.dir) {
            return uri.to_string();
        }

        match self.copy_into_store(source).await {
            Ok(destination) => {
                let path = destination.display().to_string();
                if had_scheme {
                    format!("{FILE_SCHEME}{path}")
                } else {
                    path
                }
            }
            Err(err) => {
                warn!(
                    target: "offline::images",
                    uri = %uri,
                    error = %err,
                    "failed to persist offline image, keeping original uri"
                );
                uri.to_string()
            }
        }
    }
}

/// クエリ文字列を除いた拡張子を小文字で返す。`jpeg` は `jpg` に揃える。
pub fn normalize_extension(uri: &str) -> String {
    let without_query = uri.split('?').next().unwrap_or_default();
    let file_name = without_query.rsplit('/').next().unwrap_or_default();
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return String::new();
    };
    let extension = extension.to_ascii_lowercase();
    if extension == "jpeg" {
        "jpg".to_string()
    } else {
        extension
    }
}
