//! Repository for `vn_screenshots`.
//!
//! Saves and deletes run the file lifecycle of
//! [`AssetStore`](vnt_core::screenshots::AssetStore) against a
//! [`PgScreenshotStore`] transaction, so the row and its file references
//! are committed together.

use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_core::screenshots::{AssetStore, SavedScreenshot};
use vnt_core::types::DbId;
use vnt_core::validation::validate_input;

use crate::error::{found, map_db_error};
use crate::models::screenshot::{SaveScreenshot, Screenshot};
use crate::stores::PgScreenshotStore;

/// Column list for vn_screenshots queries.
const COLUMNS: &str = "\
    id, visual_novel_id, title, image_path, miniature_path, is_published, \
    created_at, updated_at";

pub struct ScreenshotRepo;

impl ScreenshotRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Screenshot, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM vn_screenshots WHERE id = $1");
        let row = sqlx::query_as::<_, Screenshot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "screenshot", id)
    }

    /// Screenshots of a novel in upload order; unpublished ones only when
    /// `include_unpublished`.
    pub async fn list_for_visual_novel(
        pool: &PgPool,
        visual_novel_id: DbId,
        include_unpublished: bool,
    ) -> Result<Vec<Screenshot>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM vn_screenshots \
             WHERE visual_novel_id = $1 AND (is_published OR $2) \
             ORDER BY id"
        );
        sqlx::query_as::<_, Screenshot>(&query)
            .bind(visual_novel_id)
            .bind(include_unpublished)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    /// Create (`id == None`) or update a screenshot and make sure its
    /// miniature exists.
    pub async fn save(
        pool: &PgPool,
        assets: &AssetStore,
        id: Option<DbId>,
        input: SaveScreenshot,
    ) -> Result<SavedScreenshot, CoreError> {
        validate_input(&input)?;
        let mut store = PgScreenshotStore::begin(pool).await?;
        let saved = assets.save(&mut store, input.into_draft(id)).await?;
        store.commit().await?;
        Ok(saved)
    }

    /// Unpublish a screenshot, or with `force` remove the row and its files.
    pub async fn delete(
        pool: &PgPool,
        assets: &AssetStore,
        id: DbId,
        force: bool,
    ) -> Result<bool, CoreError> {
        let mut store = PgScreenshotStore::begin(pool).await?;
        let deleted = assets.delete(&mut store, id, force).await?;
        store.commit().await?;
        Ok(deleted)
    }
}
