//! Screenshot image / miniature lifecycle.
//!
//! A screenshot owns two files: the uploaded original and a miniature
//! derived from it. The miniature lives at a deterministic path (see
//! [`media::miniature_path`]) and is treated as a cache: it is rendered
//! only when no file exists at that path, and both files are removed when
//! the original is replaced. A stale miniature with the right name is
//! accepted as valid.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::MediaConfig;
use crate::error::CoreError;
use crate::media::{self, thumbnail, BlobStore};
use crate::types::DbId;

/// File references stored on a screenshot row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenshotFiles {
    pub image: Option<String>,
    pub miniature: Option<String>,
}

/// Screenshot fields supplied by the caller on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenshotDraft {
    /// `None` creates a new screenshot.
    pub id: Option<DbId>,
    pub visual_novel_id: Option<DbId>,
    pub title: Option<String>,
    /// Stored path of the original, as returned by [`AssetStore::upload_screenshot`].
    pub image: Option<String>,
    pub is_published: bool,
}

/// Persistence operations the screenshot lifecycle needs.
#[async_trait]
pub trait ScreenshotStore: Send {
    /// Files currently recorded for `id`, or `None` when the row does not exist.
    async fn files(&mut self, id: DbId) -> Result<Option<ScreenshotFiles>, CoreError>;

    /// Insert (`draft.id == None`) or update the row, storing `miniature` as
    /// the miniature reference. Returns the row id.
    async fn write_record(
        &mut self,
        draft: &ScreenshotDraft,
        miniature: Option<&str>,
    ) -> Result<DbId, CoreError>;

    /// Record the miniature reference of an existing row.
    async fn set_miniature(&mut self, id: DbId, miniature: Option<&str>) -> Result<(), CoreError>;

    /// Mark the row unpublished. Returns `false` if no row matched.
    async fn unpublish(&mut self, id: DbId) -> Result<bool, CoreError>;

    /// Delete the row. Returns `false` if no row matched.
    async fn remove(&mut self, id: DbId) -> Result<bool, CoreError>;
}

/// What [`AssetStore::derive_miniature`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Miniature {
    /// Stored miniature path, `None` when there is no original.
    pub path: Option<String>,
    /// `true` if the miniature was rendered by this call.
    pub generated: bool,
}

/// Outcome of [`AssetStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedScreenshot {
    pub id: DbId,
    pub image: Option<String>,
    pub miniature: Option<String>,
    /// `true` if the miniature was rendered during this save.
    pub miniature_generated: bool,
    /// `true` if a previous original (and its miniature) was removed.
    pub replaced_previous: bool,
}

/// A miniature located or rendered but not yet written. `bytes` is `None`
/// when a usable file already exists at `path`.
struct PendingMiniature {
    path: String,
    bytes: Option<Vec<u8>>,
}

/// Stores originals and derives miniatures according to the media
/// directory policy.
#[derive(Clone)]
pub struct AssetStore {
    blobs: Arc<dyn BlobStore>,
    config: MediaConfig,
}

impl AssetStore {
    pub fn new(blobs: Arc<dyn BlobStore>, config: MediaConfig) -> Self {
        Self { blobs, config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    /// Store a screenshot original in the screenshot directory.
    pub async fn upload_screenshot(&self, file_name: &str, bytes: &[u8]) -> Result<String, CoreError> {
        media::upload(self.blobs.as_ref(), &self.config.screenshot_dir, file_name, bytes).await
    }

    /// Store a visual-novel poster in the poster directory.
    pub async fn upload_poster(&self, file_name: &str, bytes: &[u8]) -> Result<String, CoreError> {
        media::upload(self.blobs.as_ref(), &self.config.poster_dir, file_name, bytes).await
    }

    /// Save a screenshot in two phases: the record with its (possibly new)
    /// original first, then the miniature derived from the stored original.
    ///
    /// A blank image reference means the screenshot has no original. When
    /// the original differs from the stored one, the new miniature is
    /// rendered in memory first; the old original and its miniature are
    /// deleted only once that succeeded.
    pub async fn save<S>(&self, store: &mut S, mut draft: ScreenshotDraft) -> Result<SavedScreenshot, CoreError>
    where
        S: ScreenshotStore + ?Sized,
    {
        draft.image = draft.image.filter(|path| !path.trim().is_empty());

        let previous = match draft.id {
            Some(id) => Some(
                store
                    .files(id)
                    .await?
                    .ok_or(CoreError::NotFound { entity: "screenshot", id })?,
            ),
            None => None,
        };
        let (replaced, kept_miniature) = match previous {
            Some(previous) if previous.image != draft.image => (Some(previous), None),
            Some(previous) => (None, previous.miniature),
            None => (None, None),
        };

        let pending = match draft.image.as_deref() {
            Some(image) => {
                let stale = replaced.as_ref().and_then(|files| files.miniature.as_deref());
                Some(self.prepare_miniature(image, stale).await?)
            }
            None => None,
        };

        let mut replaced_previous = false;
        if let Some(files) = &replaced {
            self.delete_files(files).await?;
            replaced_previous = files.image.is_some() || files.miniature.is_some();
        }

        let id = store.write_record(&draft, kept_miniature.as_deref()).await?;
        let miniature = match pending {
            Some(pending) => self.store_miniature(pending).await?,
            None => Miniature::default(),
        };
        store.set_miniature(id, miniature.path.as_deref()).await?;

        tracing::info!(
            screenshot_id = id,
            image = ?draft.image,
            miniature_generated = miniature.generated,
            replaced_previous,
            "Saved screenshot"
        );

        Ok(SavedScreenshot {
            id,
            image: draft.image,
            miniature: miniature.path,
            miniature_generated: miniature.generated,
            replaced_previous,
        })
    }

    /// Make sure the miniature for `image` exists at its deterministic path.
    ///
    /// Nothing happens without an original (a blank reference counts as
    /// none), and an existing file at the miniature path is reused as-is.
    pub async fn derive_miniature(&self, image: Option<&str>) -> Result<Miniature, CoreError> {
        let Some(image) = image.filter(|path| !path.trim().is_empty()) else {
            return Ok(Miniature::default());
        };
        let pending = self.prepare_miniature(image, None).await?;
        self.store_miniature(pending).await
    }

    /// Locate or render the miniature of `image` without writing anything.
    ///
    /// A file at the miniature path is a valid cache unless it is `stale`,
    /// i.e. about to be deleted along with a replaced original.
    async fn prepare_miniature(
        &self,
        image: &str,
        stale: Option<&str>,
    ) -> Result<PendingMiniature, CoreError> {
        let path = media::miniature_path(&self.config, image)?;
        if stale != Some(path.as_str()) && self.blobs.exists(&path).await? {
            return Ok(PendingMiniature { path, bytes: None });
        }

        let original = self.blobs.read(image).await?;
        let bytes =
            thumbnail::render_miniature_blocking(original, path.clone(), self.config.thumbnail_width)
                .await?;
        tracing::debug!(image, miniature = %path, "Rendered miniature");
        Ok(PendingMiniature {
            path,
            bytes: Some(bytes),
        })
    }

    async fn store_miniature(&self, pending: PendingMiniature) -> Result<Miniature, CoreError> {
        let generated = match &pending.bytes {
            Some(bytes) => {
                self.blobs.write(&pending.path, bytes).await?;
                true
            }
            None => false,
        };
        Ok(Miniature {
            path: Some(pending.path),
            generated,
        })
    }

    /// Delete a screenshot. With `force`, both files and the row are removed
    /// (missing files are ignored); otherwise the row is only unpublished.
    ///
    /// Returns `false` when no screenshot with `id` exists.
    pub async fn delete<S>(&self, store: &mut S, id: DbId, force: bool) -> Result<bool, CoreError>
    where
        S: ScreenshotStore + ?Sized,
    {
        if !force {
            return store.unpublish(id).await;
        }
        let Some(files) = store.files(id).await? else {
            return Ok(false);
        };
        self.delete_files(&files).await?;
        let removed = store.remove(id).await?;
        tracing::info!(screenshot_id = id, "Deleted screenshot and its files");
        Ok(removed)
    }

    /// Best-effort removal of both files of a screenshot.
    async fn delete_files(&self, files: &ScreenshotFiles) -> Result<(), CoreError> {
        media::delete_if_present(self.blobs.as_ref(), files.miniature.as_deref()).await?;
        media::delete_if_present(self.blobs.as_ref(), files.image.as_deref()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use image::ImageFormat;

    use super::*;
    use crate::media::thumbnail::tests::sample_image;
    use crate::media::LocalBlobStore;

    #[derive(Debug, Clone)]
    struct Row {
        draft: ScreenshotDraft,
        miniature: Option<String>,
    }

    #[derive(Default)]
    struct MemoryScreenshots {
        rows: HashMap<DbId, Row>,
        next_id: DbId,
        writes: usize,
    }

    #[async_trait]
    impl ScreenshotStore for MemoryScreenshots {
        async fn files(&mut self, id: DbId) -> Result<Option<ScreenshotFiles>, CoreError> {
            Ok(self.rows.get(&id).map(|r| ScreenshotFiles {
                image: r.draft.image.clone(),
                miniature: r.miniature.clone(),
            }))
        }

        async fn write_record(
            &mut self,
            draft: &ScreenshotDraft,
            miniature: Option<&str>,
        ) -> Result<DbId, CoreError> {
            self.writes += 1;
            let id = match draft.id {
                Some(id) if self.rows.contains_key(&id) => id,
                Some(id) => return Err(CoreError::NotFound { entity: "screenshot", id }),
                None => {
                    self.next_id += 1;
                    self.next_id
                }
            };
            let mut draft = draft.clone();
            draft.id = Some(id);
            self.rows.insert(
                id,
                Row {
                    draft,
                    miniature: miniature.map(str::to_string),
                },
            );
            Ok(id)
        }

        async fn set_miniature(&mut self, id: DbId, miniature: Option<&str>) -> Result<(), CoreError> {
            self.writes += 1;
            let row = self
                .rows
                .get_mut(&id)
                .ok_or(CoreError::NotFound { entity: "screenshot", id })?;
            row.miniature = miniature.map(str::to_string);
            Ok(())
        }

        async fn unpublish(&mut self, id: DbId) -> Result<bool, CoreError> {
            Ok(self
                .rows
                .get_mut(&id)
                .map(|r| r.draft.is_published = false)
                .is_some())
        }

        async fn remove(&mut self, id: DbId) -> Result<bool, CoreError> {
            Ok(self.rows.remove(&id).is_some())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        blobs: Arc<LocalBlobStore>,
        assets: AssetStore,
        store: MemoryScreenshots,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(LocalBlobStore::new(dir.path()));
        let config = MediaConfig {
            media_root: dir.path().to_path_buf(),
            ..MediaConfig::default()
        };
        let assets = AssetStore::new(blobs.clone(), config);
        Fixture {
            _dir: dir,
            blobs,
            assets,
            store: MemoryScreenshots::default(),
        }
    }

    fn draft(id: Option<DbId>, image: Option<&str>) -> ScreenshotDraft {
        ScreenshotDraft {
            id,
            visual_novel_id: None,
            title: Some("Opening".into()),
            image: image.map(str::to_string),
            is_published: true,
        }
    }

    #[tokio::test]
    async fn new_screenshot_gets_a_miniature() {
        let mut f = fixture();
        let image = f
            .assets
            .upload_screenshot("opening.png", &sample_image(600, 300, ImageFormat::Png))
            .await
            .unwrap();

        let saved = f.assets.save(&mut f.store, draft(None, Some(&image))).await.unwrap();

        assert_eq!(saved.miniature.as_deref(), Some("vn/screenshots/mini/opening.png"));
        assert!(saved.miniature_generated);
        assert!(!saved.replaced_previous);
        assert_eq!(f.store.writes, 2, "record and miniature are written separately");

        let bytes = f.blobs.read("vn/screenshots/mini/opening.png").await.unwrap();
        let mini = image::load_from_memory(&bytes).unwrap();
        assert_eq!((mini.width(), mini.height()), (150, 75));
        assert_eq!(
            f.store.rows[&saved.id].miniature.as_deref(),
            Some("vn/screenshots/mini/opening.png")
        );
    }

    #[tokio::test]
    async fn unchanged_image_reuses_the_cached_miniature() {
        let mut f = fixture();
        let image = f
            .assets
            .upload_screenshot("opening.png", &sample_image(600, 300, ImageFormat::Png))
            .await
            .unwrap();
        let first = f.assets.save(&mut f.store, draft(None, Some(&image))).await.unwrap();

        // Anything at the miniature path counts as a valid cache.
        f.blobs.write("vn/screenshots/mini/opening.png", b"cached").await.unwrap();

        let second = f
            .assets
            .save(&mut f.store, draft(Some(first.id), Some(&image)))
            .await
            .unwrap();
        assert!(!second.miniature_generated);
        assert_eq!(second.miniature, first.miniature);
        assert_eq!(
            f.blobs.read("vn/screenshots/mini/opening.png").await.unwrap(),
            b"cached"
        );
    }

    #[tokio::test]
    async fn changed_image_deletes_previous_files() {
        let mut f = fixture();
        let old = f
            .assets
            .upload_screenshot("old.png", &sample_image(300, 300, ImageFormat::Png))
            .await
            .unwrap();
        let saved = f.assets.save(&mut f.store, draft(None, Some(&old))).await.unwrap();
        assert!(f.blobs.exists("vn/screenshots/mini/old.png").await.unwrap());

        let new = f
            .assets
            .upload_screenshot("new.jpg", &sample_image(300, 600, ImageFormat::Jpeg))
            .await
            .unwrap();
        let resaved = f
            .assets
            .save(&mut f.store, draft(Some(saved.id), Some(&new)))
            .await
            .unwrap();

        assert!(resaved.replaced_previous);
        assert!(resaved.miniature_generated);
        assert!(!f.blobs.exists(&old).await.unwrap());
        assert!(!f.blobs.exists("vn/screenshots/mini/old.png").await.unwrap());
        assert!(f.blobs.exists("vn/screenshots/mini/new.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn failed_replace_keeps_previous_files() {
        let mut f = fixture();
        let old = f
            .assets
            .upload_screenshot("old.png", &sample_image(300, 300, ImageFormat::Png))
            .await
            .unwrap();
        let saved = f.assets.save(&mut f.store, draft(None, Some(&old))).await.unwrap();
        let writes = f.store.writes;

        let broken = f
            .assets
            .upload_screenshot("new.png", b"not an image")
            .await
            .unwrap();
        let err = f
            .assets
            .save(&mut f.store, draft(Some(saved.id), Some(&broken)))
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Image(_));
        assert_eq!(f.store.writes, writes, "nothing written after a failed render");
        assert!(f.blobs.exists(&old).await.unwrap());
        assert!(f.blobs.exists("vn/screenshots/mini/old.png").await.unwrap());
        assert!(!f.blobs.exists("vn/screenshots/mini/new.png").await.unwrap());
    }

    #[tokio::test]
    async fn replacing_with_a_missing_original_keeps_previous_files() {
        let mut f = fixture();
        let old = f
            .assets
            .upload_screenshot("old.png", &sample_image(300, 300, ImageFormat::Png))
            .await
            .unwrap();
        let saved = f.assets.save(&mut f.store, draft(None, Some(&old))).await.unwrap();

        let err = f
            .assets
            .save(&mut f.store, draft(Some(saved.id), Some("vn/screenshots/never.png")))
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::FileNotFound(_));
        assert!(f.blobs.exists(&old).await.unwrap());
        assert!(f.blobs.exists("vn/screenshots/mini/old.png").await.unwrap());
    }

    #[tokio::test]
    async fn replacement_sharing_the_miniature_name_is_rendered_fresh() {
        let mut f = fixture();
        let old = f
            .assets
            .upload_screenshot("shot.png", &sample_image(300, 300, ImageFormat::Png))
            .await
            .unwrap();
        let saved = f.assets.save(&mut f.store, draft(None, Some(&old))).await.unwrap();

        f.blobs
            .write("vn/elsewhere/shot.png", &sample_image(600, 300, ImageFormat::Png))
            .await
            .unwrap();
        let resaved = f
            .assets
            .save(&mut f.store, draft(Some(saved.id), Some("vn/elsewhere/shot.png")))
            .await
            .unwrap();

        assert!(resaved.replaced_previous);
        assert!(resaved.miniature_generated);
        assert!(!f.blobs.exists(&old).await.unwrap());
        let bytes = f.blobs.read("vn/screenshots/mini/shot.png").await.unwrap();
        let mini = image::load_from_memory(&bytes).unwrap();
        assert_eq!((mini.width(), mini.height()), (150, 75));
    }

    #[tokio::test]
    async fn blank_image_is_treated_as_none() {
        let mut f = fixture();
        let saved = f.assets.save(&mut f.store, draft(None, Some(""))).await.unwrap();
        assert_eq!(saved.image, None);
        assert_eq!(saved.miniature, None);
        assert_eq!(f.store.rows[&saved.id].draft.image, None);

        let miniature = f.assets.derive_miniature(Some("  ")).await.unwrap();
        assert_eq!(miniature, Miniature::default());
    }

    #[tokio::test]
    async fn no_image_means_no_miniature() {
        let mut f = fixture();
        let saved = f.assets.save(&mut f.store, draft(None, None)).await.unwrap();
        assert_eq!(saved.miniature, None);
        assert!(!saved.miniature_generated);
    }

    #[tokio::test]
    async fn updating_a_missing_screenshot_is_not_found() {
        let mut f = fixture();
        let err = f.assets.save(&mut f.store, draft(Some(42), None)).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { id: 42, .. });
    }

    #[tokio::test]
    async fn soft_delete_keeps_row_and_files() {
        let mut f = fixture();
        let image = f
            .assets
            .upload_screenshot("keep.png", &sample_image(200, 100, ImageFormat::Png))
            .await
            .unwrap();
        let saved = f.assets.save(&mut f.store, draft(None, Some(&image))).await.unwrap();

        assert!(f.assets.delete(&mut f.store, saved.id, false).await.unwrap());

        let row = &f.store.rows[&saved.id];
        assert!(!row.draft.is_published);
        assert!(f.blobs.exists(&image).await.unwrap());
        assert!(f.blobs.exists("vn/screenshots/mini/keep.png").await.unwrap());
    }

    #[tokio::test]
    async fn forced_delete_removes_everything_and_tolerates_missing_files() {
        let mut f = fixture();
        let image = f
            .assets
            .upload_screenshot("gone.png", &sample_image(200, 100, ImageFormat::Png))
            .await
            .unwrap();
        let saved = f.assets.save(&mut f.store, draft(None, Some(&image))).await.unwrap();

        // The miniature vanished behind our back.
        f.blobs.delete("vn/screenshots/mini/gone.png").await.unwrap();

        assert!(f.assets.delete(&mut f.store, saved.id, true).await.unwrap());
        assert!(!f.store.rows.contains_key(&saved.id));
        assert!(!f.blobs.exists(&image).await.unwrap());

        assert!(!f.assets.delete(&mut f.store, saved.id, true).await.unwrap());
    }

    #[tokio::test]
    async fn missing_original_surfaces_on_save() {
        let mut f = fixture();
        let err = f
            .assets
            .save(&mut f.store, draft(None, Some("vn/screenshots/never.png")))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::FileNotFound(_));
    }

    #[tokio::test]
    async fn posters_go_to_the_poster_directory() {
        let f = fixture();
        let path = f.assets.upload_poster("cover.jpg", b"jpeg").await.unwrap();
        assert_eq!(path, "vn/posters/cover.jpg");
    }
}
