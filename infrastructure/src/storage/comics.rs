//! File-backed comic store

use super::{export, write_atomic};
use async_trait::async_trait;
use math_comic_application::{ComicStore, ImageAssetStore, StoreError};
use math_comic_domain::{ComicMetadata, ComicStatistics, ExportFormat, MultiPanelComic};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};

const MAX_ID_LEN: usize = 64;

/// Orphaned images used this recently survive a delete
const DEFAULT_ORPHAN_GRACE: Duration = Duration::from_secs(600);

/// Stores each comic as `<root>/comics/<id>.json` with a metadata index at
/// `<root>/index.json`.
///
/// Writers of one id are serialized by a per-id `RwLock`; the index has its
/// own lock. Both record and index are replaced by atomic rename.
pub struct FileComicStore {
    root: PathBuf,
    images: Arc<dyn ImageAssetStore>,
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
    index_lock: AsyncMutex<()>,
    orphan_grace: Duration,
}

impl FileComicStore {
    pub fn new(root: impl Into<PathBuf>, images: Arc<dyn ImageAssetStore>) -> Self {
        Self {
            root: root.into(),
            images,
            locks: Mutex::new(HashMap::new()),
            index_lock: AsyncMutex::new(()),
            orphan_grace: DEFAULT_ORPHAN_GRACE,
        }
    }

    /// How long after its last use an orphaned image is kept on delete.
    ///
    /// A pipeline may reuse an image between rendering and saving its comic;
    /// within this window the file is left in place.
    pub fn with_orphan_grace(mut self, grace: Duration) -> Self {
        self.orphan_grace = grace;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn comics_dir(&self) -> PathBuf {
        self.root.join("comics")
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.comics_dir().join(format!("{}.json", id))
    }

    fn lock_for(&self, id: &str) -> Arc<RwLock<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    async fn read_record(&self, id: &str) -> Result<Option<MultiPanelComic>, StoreError> {
        match tokio::fs::read(self.record_path(id)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("{}: {}", id, e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn image_bytes(&self, comic: &MultiPanelComic) -> u64 {
        let mut total = 0;
        for file in comic.image_files() {
            match self.images.size(&file).await {
                Ok(Some(size)) => total += size,
                Ok(None) => debug!(file = %file, "Image missing while indexing"),
                Err(e) => warn!(file = %file, "Could not stat image: {}", e),
            }
        }
        total
    }

    /// Read the index; a missing index is empty, a corrupt one is rebuilt.
    ///
    /// Callers must hold `index_lock`.
    async fn read_index(&self) -> Result<Vec<ComicMetadata>, StoreError> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    warn!("Comic index is corrupt ({}), rebuilding", e);
                    let entries = self.scan_records().await?;
                    self.write_index(&entries).await?;
                    Ok(entries)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, entries: &[ComicMetadata]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::create_dir_all(&self.root).await?;
        write_atomic(&self.index_path(), &bytes).await?;
        Ok(())
    }

    async fn scan_records(&self) -> Result<Vec<ComicMetadata>, StoreError> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(self.comics_dir()).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(bytes) = tokio::fs::read(&path).await else {
                continue;
            };
            match serde_json::from_slice::<MultiPanelComic>(&bytes) {
                Ok(comic) => {
                    let image_bytes = self.image_bytes(&comic).await;
                    entries.push(comic.metadata(image_bytes));
                }
                Err(e) => warn!(path = %path.display(), "Skipping unreadable comic: {}", e),
            }
        }
        Ok(entries)
    }

    /// Whether an image was written or reused at or after `since`.
    ///
    /// Renderers touch an image when they reuse it.
    async fn recently_used(&self, file_name: &str, since: SystemTime) -> bool {
        tokio::fs::metadata(self.images.path(file_name))
            .await
            .and_then(|m| m.modified())
            .map(|modified| modified >= since)
            .unwrap_or(false)
    }

    async fn update_index(
        &self,
        update: impl FnOnce(&mut Vec<ComicMetadata>),
    ) -> Result<Vec<ComicMetadata>, StoreError> {
        let _guard = self.index_lock.lock().await;
        let mut entries = self.read_index().await?;
        update(&mut entries);
        self.write_index(&entries).await?;
        Ok(entries)
    }
}

/// Ids become file names, so only a safe character set is accepted
fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

fn newest_first(entries: &mut [ComicMetadata]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl ComicStore for FileComicStore {
    async fn save_comic(&self, comic: &MultiPanelComic) -> Result<String, StoreError> {
        validate_id(&comic.id)?;
        let bytes = serde_json::to_vec_pretty(comic)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let metadata = comic.metadata(self.image_bytes(comic).await);

        // Record and index entry under one id guard; lock order is id, then index
        let lock = self.lock_for(&comic.id);
        let _write = lock.write().await;
        tokio::fs::create_dir_all(self.comics_dir()).await?;
        write_atomic(&self.record_path(&comic.id), &bytes).await?;
        self.update_index(|entries| {
            entries.retain(|e| e.id != metadata.id);
            entries.push(metadata);
        })
        .await?;

        info!(id = %comic.id, panels = comic.panel_count(), "Comic saved");
        Ok(comic.id.clone())
    }

    async fn load_comic(&self, id: &str) -> Result<Option<MultiPanelComic>, StoreError> {
        validate_id(id)?;
        let lock = self.lock_for(id);
        let _read = lock.read().await;
        self.read_record(id).await
    }

    async fn list_comics(&self) -> Result<Vec<ComicMetadata>, StoreError> {
        let mut entries = {
            let _guard = self.index_lock.lock().await;
            self.read_index().await?
        };
        newest_first(&mut entries);
        Ok(entries)
    }

    async fn delete_comic(&self, id: &str) -> Result<bool, StoreError> {
        validate_id(id)?;
        let cutoff = SystemTime::now()
            .checked_sub(self.orphan_grace)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let lock = self.lock_for(id);
        let _write = lock.write().await;

        let images = self
            .read_record(id)
            .await
            .ok()
            .flatten()
            .map(|c| c.image_files())
            .unwrap_or_default();
        let removed = match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        let remaining = self
            .update_index(|entries| entries.retain(|e| e.id != id))
            .await?;

        if !removed {
            return Ok(false);
        }

        let still_used: HashSet<&str> = remaining
            .iter()
            .flat_map(|e| e.image_files.iter().map(String::as_str))
            .collect();
        for file in images.iter().filter(|f| !still_used.contains(f.as_str())) {
            if self.recently_used(file, cutoff).await {
                debug!(file = %file, "Keeping image touched by a running pipeline");
                continue;
            }
            if let Err(e) = self.images.remove(file).await {
                warn!(file = %file, "Could not remove orphaned image: {}", e);
            }
        }

        info!(id, "Comic deleted");
        Ok(true)
    }

    async fn export_comic(&self, id: &str, format: ExportFormat) -> Result<Vec<u8>, StoreError> {
        let comic = self
            .load_comic(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match format {
            ExportFormat::Json => {
                export::to_json(&comic).map_err(|e| StoreError::Serialization(e.to_string()))
            }
            ExportFormat::Markdown => Ok(export::to_markdown(&comic, None).into_bytes()),
            ExportFormat::Bundle => {
                let mut images = Vec::with_capacity(comic.panel_count());
                for file in comic.image_files() {
                    let bytes = self
                        .images
                        .read(&file)
                        .await
                        .map_err(|e| StoreError::Export(e.to_string()))?;
                    images.push((file, bytes));
                }
                export::to_bundle(&comic, &images).map_err(|e| StoreError::Export(e.to_string()))
            }
        }
    }

    async fn get_statistics(&self) -> Result<ComicStatistics, StoreError> {
        let entries = {
            let _guard = self.index_lock.lock().await;
            self.read_index().await?
        };
        Ok(ComicStatistics::from_metadata(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalImageAssetStore;
    use chrono::{Duration as ChronoDuration, Utc};
    use math_comic_application::ImageArtifact;
    use math_comic_domain::{
        AgeGroup, ComicAssembler, ComicContent, ComicStyle, ConceptValidator, ImageRef,
        OptionsProcessor, PanelContent,
    };
    use std::time::Duration;

    struct Fixture {
        _dir: tempfile::TempDir,
        images: Arc<LocalImageAssetStore>,
        store: FileComicStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(
            LocalImageAssetStore::new(dir.path().join("images"), "/images", Duration::from_secs(1))
                .unwrap(),
        );
        let store = FileComicStore::new(dir.path(), Arc::clone(&images) as Arc<dyn ImageAssetStore>)
            .with_orphan_grace(Duration::ZERO);
        Fixture {
            _dir: dir,
            images,
            store,
        }
    }

    /// A comic whose panel images are `<prefix>_<n>.png`
    fn comic(prefix: &str, age_group: AgeGroup, style: ComicStyle) -> MultiPanelComic {
        let concept = ConceptValidator::default()
            .parse_math_concept("三角形的面积")
            .unwrap();
        let mut options = OptionsProcessor::default().apply_defaults(None);
        options.age_group = age_group;
        options.style = style;
        options.panel_count = 2;

        let content = ComicContent {
            title: format!("Comic {}", prefix),
            panels: vec![PanelContent::new("one"), PanelContent::new("two")],
        };
        let images = (1..=2)
            .map(|n| ImageRef {
                file_name: format!("{}_{}.png", prefix, n),
                url: format!("/images/{}_{}.png", prefix, n),
                path: String::new(),
            })
            .collect();
        ComicAssembler::assemble(&concept, &options, content, images).unwrap()
    }

    async fn store_images(images: &LocalImageAssetStore, comic: &MultiPanelComic, size: usize) {
        for file in comic.image_files() {
            images
                .store(&file, ImageArtifact::Bytes(vec![0u8; size]))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let f = fixture();
        let comic = comic("a", AgeGroup::Child, ComicStyle::Cartoon);
        store_images(&f.images, &comic, 5).await;

        let id = f.store.save_comic(&comic).await.unwrap();
        assert_eq!(id, comic.id);
        assert_eq!(f.store.load_comic(&id).await.unwrap(), Some(comic.clone()));

        let listed = f.store.list_comics().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].image_bytes, 10);
        assert!(f.store.root().join("comics").join(format!("{}.json", id)).exists());
    }

    #[tokio::test]
    async fn test_load_unknown_is_none() {
        let f = fixture();
        assert_eq!(f.store.load_comic("missing-id").await.unwrap(), None);
        assert!(!f.store.delete_comic("missing-id").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_ids() {
        let f = fixture();
        for id in ["", "../etc/passwd", "a/b", "x.json"] {
            assert!(matches!(
                f.store.load_comic(id).await,
                Err(StoreError::InvalidId(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_resave_overwrites_single_record() {
        let f = fixture();
        let mut comic = comic("a", AgeGroup::Child, ComicStyle::Cartoon);
        f.store.save_comic(&comic).await.unwrap();

        comic.title = "Retitled".to_string();
        f.store.save_comic(&comic).await.unwrap();

        let listed = f.store.list_comics().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Retitled");
        assert_eq!(
            f.store.load_comic(&comic.id).await.unwrap().unwrap().title,
            "Retitled"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_keep_one_complete_record() {
        let f = Arc::new(fixture());
        let base = comic("a", AgeGroup::Child, ComicStyle::Cartoon);

        for round in 0..20 {
            let mut handles = Vec::new();
            for i in 0..8 {
                let f = Arc::clone(&f);
                let mut comic = base.clone();
                comic.title = format!("Version {}.{}", round, i);
                handles.push(tokio::spawn(async move {
                    f.store.save_comic(&comic).await.unwrap();
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            let loaded = f.store.load_comic(&base.id).await.unwrap().unwrap();
            assert!(loaded.title.starts_with(&format!("Version {}.", round)));
            assert_eq!(loaded.panels, base.panels);

            let listed = f.store.list_comics().await.unwrap();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0], loaded.metadata(listed[0].image_bytes));
        }

        let leftovers: Vec<_> = std::fs::read_dir(f.store.root().join("comics"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let f = fixture();
        let mut older = comic("old", AgeGroup::Child, ComicStyle::Cartoon);
        older.created_at = Utc::now() - ChronoDuration::hours(1);
        let newer = comic("new", AgeGroup::Teen, ComicStyle::Manga);

        f.store.save_comic(&older).await.unwrap();
        f.store.save_comic(&newer).await.unwrap();

        let ids: Vec<_> = f
            .store
            .list_comics()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_orphaned_images() {
        let f = fixture();
        let first = comic("shared", AgeGroup::Child, ComicStyle::Cartoon);
        let mut second = comic("shared", AgeGroup::Child, ComicStyle::Cartoon);
        second.panels[1].image.file_name = "own_2.png".to_string();
        store_images(&f.images, &first, 3).await;
        store_images(&f.images, &second, 3).await;

        f.store.save_comic(&first).await.unwrap();
        f.store.save_comic(&second).await.unwrap();

        assert!(f.store.delete_comic(&second.id).await.unwrap());
        assert_eq!(f.images.size("own_2.png").await.unwrap(), None);
        assert_eq!(f.images.size("shared_1.png").await.unwrap(), Some(3));

        assert!(f.store.delete_comic(&first.id).await.unwrap());
        assert_eq!(f.images.size("shared_1.png").await.unwrap(), None);
        assert!(f.store.list_comics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_formats() {
        let f = fixture();
        let comic = comic("x", AgeGroup::Child, ComicStyle::Cartoon);
        store_images(&f.images, &comic, 4).await;
        f.store.save_comic(&comic).await.unwrap();

        let json = f.store.export_comic(&comic.id, ExportFormat::Json).await.unwrap();
        let back: MultiPanelComic = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, comic);

        let md = f
            .store
            .export_comic(&comic.id, ExportFormat::Markdown)
            .await
            .unwrap();
        assert!(String::from_utf8(md).unwrap().contains("# Comic x"));

        let bundle = f
            .store
            .export_comic(&comic.id, ExportFormat::Bundle)
            .await
            .unwrap();
        assert_eq!(&bundle[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn test_export_unknown_is_not_found() {
        let f = fixture();
        let result = f.store.export_comic("nope", ExportFormat::Json).await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_bundle_requires_images() {
        let f = fixture();
        let comic = comic("x", AgeGroup::Child, ComicStyle::Cartoon);
        f.store.save_comic(&comic).await.unwrap();

        let result = f.store.export_comic(&comic.id, ExportFormat::Bundle).await;
        assert!(matches!(result, Err(StoreError::Export(_))));
    }

    #[tokio::test]
    async fn test_statistics_from_index() {
        let f = fixture();
        let a = comic("a", AgeGroup::Child, ComicStyle::Cartoon);
        let b = comic("b", AgeGroup::Teen, ComicStyle::Manga);
        store_images(&f.images, &a, 10).await;
        f.store.save_comic(&a).await.unwrap();
        f.store.save_comic(&b).await.unwrap();

        let stats = f.store.get_statistics().await.unwrap();
        assert_eq!(stats.total_comics, 2);
        assert_eq!(stats.total_panels, 4);
        assert_eq!(stats.average_panels, 2.0);
        assert_eq!(stats.by_age_group.get("teen"), Some(&1));
        assert_eq!(stats.by_style.get("cartoon"), Some(&1));
        assert_eq!(stats.total_image_bytes, 20);
        assert!(stats.oldest <= stats.newest);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_rebuilt() {
        let f = fixture();
        let comic = comic("a", AgeGroup::Adult, ComicStyle::Realistic);
        f.store.save_comic(&comic).await.unwrap();
        std::fs::write(f.store.root().join("index.json"), "{not json").unwrap();

        let listed = f.store.list_comics().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, comic.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_save_racing_delete_keeps_index_in_step() {
        let f = Arc::new(fixture());
        let base = comic("a", AgeGroup::Child, ComicStyle::Cartoon);

        for _ in 0..20 {
            let saver = {
                let f = Arc::clone(&f);
                let comic = base.clone();
                tokio::spawn(async move { f.store.save_comic(&comic).await.unwrap() })
            };
            let deleter = {
                let f = Arc::clone(&f);
                let id = base.id.clone();
                tokio::spawn(async move { f.store.delete_comic(&id).await.unwrap() })
            };
            saver.await.unwrap();
            deleter.await.unwrap();

            let on_disk = f.store.load_comic(&base.id).await.unwrap().is_some();
            let indexed = f.store.list_comics().await.unwrap().len() == 1;
            assert_eq!(on_disk, indexed);
        }
    }

    #[tokio::test]
    async fn test_delete_keeps_recently_used_images() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(
            LocalImageAssetStore::new(dir.path().join("images"), "/images", Duration::from_secs(1))
                .unwrap(),
        );
        let store = FileComicStore::new(dir.path(), Arc::clone(&images) as Arc<dyn ImageAssetStore>)
            .with_orphan_grace(Duration::from_secs(3600));
        let comic = comic("busy", AgeGroup::Child, ComicStyle::Cartoon);
        store_images(&images, &comic, 2).await;
        store.save_comic(&comic).await.unwrap();

        assert!(store.delete_comic(&comic.id).await.unwrap());
        assert_eq!(store.load_comic(&comic.id).await.unwrap(), None);
        assert_eq!(images.size("busy_1.png").await.unwrap(), Some(2));
        assert_eq!(images.size("busy_2.png").await.unwrap(), Some(2));
    }
}
