//! Local filesystem image asset store

use super::write_atomic;
use async_trait::async_trait;
use math_comic_application::{AssetError, ImageArtifact, ImageAssetStore};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Stores panel images as files in a single directory
pub struct LocalImageAssetStore {
    images_dir: PathBuf,
    public_base_url: String,
    client: reqwest::Client,
}

impl LocalImageAssetStore {
    pub fn new(
        images_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        download_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()?;
        Ok(Self {
            images_dir: images_dir.into(),
            public_base_url: public_base_url.into(),
            client,
        })
    }

    pub fn images_dir(&self) -> &std::path::Path {
        &self.images_dir
    }

    fn checked_path(&self, file_name: &str) -> Result<PathBuf, AssetError> {
        let valid = !file_name.is_empty()
            && !file_name.starts_with('.')
            && !file_name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(AssetError::InvalidName(file_name.to_string()));
        }
        Ok(self.images_dir.join(file_name))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AssetError::Download(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageAssetStore for LocalImageAssetStore {
    async fn store(&self, file_name: &str, artifact: ImageArtifact) -> Result<u64, AssetError> {
        let path = self.checked_path(file_name)?;

        let bytes = match artifact {
            ImageArtifact::Bytes(bytes) => bytes,
            ImageArtifact::Url(url) => self.download(&url).await?,
        };
        if bytes.is_empty() {
            return Err(AssetError::Download(format!("empty image for {}", file_name)));
        }

        tokio::fs::create_dir_all(&self.images_dir).await?;
        write_atomic(&path, &bytes).await?;
        debug!(file = file_name, bytes = bytes.len(), "Stored image");
        Ok(bytes.len() as u64)
    }

    fn url(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), file_name)
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.images_dir.join(file_name)
    }

    async fn size(&self, file_name: &str) -> Result<Option<u64>, AssetError> {
        let path = self.checked_path(file_name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, file_name: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.checked_path(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn touch(&self, file_name: &str) -> Result<bool, AssetError> {
        let path = self.checked_path(file_name)?;
        let file = match tokio::fs::OpenOptions::new().append(true).open(&path).await {
            Ok(file) => file.into_std().await,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.set_modified(SystemTime::now())?;
        Ok(true)
    }

    async fn remove(&self, file_name: &str) -> Result<bool, AssetError> {
        let path = self.checked_path(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(dir: &tempfile::TempDir) -> LocalImageAssetStore {
        LocalImageAssetStore::new(
            dir.path().join("images"),
            "https://cdn.example.com/img/",
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_bytes_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let size = store
            .store("panel_01_abc.png", ImageArtifact::Bytes(vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(size, 3);
        assert_eq!(store.size("panel_01_abc.png").await.unwrap(), Some(3));
        assert_eq!(store.read("panel_01_abc.png").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            store.url("panel_01_abc.png"),
            "https://cdn.example.com/img/panel_01_abc.png"
        );
        assert!(store.path("panel_01_abc.png").exists());
    }

    #[tokio::test]
    async fn test_store_downloads_url_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tmp/1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let size = store
            .store(
                "panel_01_x.png",
                ImageArtifact::Url(format!("{}/tmp/1.png", server.uri())),
            )
            .await
            .unwrap();
        assert_eq!(size, 9);
        assert_eq!(store.read("panel_01_x.png").await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_failed_download_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let result = store(&dir)
            .store("p.png", ImageArtifact::Url(format!("{}/gone.png", server.uri())))
            .await;
        assert!(matches!(result, Err(AssetError::Download(_))));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        for name in ["../escape.png", "a/b.png", ".hidden", ""] {
            let result = store.store(name, ImageArtifact::Bytes(vec![1])).await;
            assert!(matches!(result, Err(AssetError::InvalidName(_))), "{name}");
        }
    }

    #[tokio::test]
    async fn test_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert_eq!(store.size("nope.png").await.unwrap(), None);
        assert!(!store.touch("nope.png").await.unwrap());
        assert!(!store.remove("nope.png").await.unwrap());
        assert!(matches!(
            store.read("nope.png").await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_touch_refreshes_modified_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store
            .store("old.png", ImageArtifact::Bytes(vec![7; 4]))
            .await
            .unwrap();
        let path = store.path("old.png");
        let day_ago = SystemTime::now() - Duration::from_secs(86_400);
        std::fs::File::options()
            .append(true)
            .open(&path)
            .unwrap()
            .set_modified(day_ago)
            .unwrap();

        let before = SystemTime::now() - Duration::from_secs(1);
        assert!(store.touch("old.png").await.unwrap());

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert!(modified >= before);
        assert_eq!(store.read("old.png").await.unwrap(), vec![7; 4]);
    }
}
