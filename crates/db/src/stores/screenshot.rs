//! `vn_screenshots` access inside one transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use vnt_core::error::CoreError;
use vnt_core::screenshots::{ScreenshotDraft, ScreenshotFiles, ScreenshotStore};
use vnt_core::types::DbId;

use crate::error::map_db_error;

/// [`ScreenshotStore`] over a PostgreSQL transaction.
pub struct PgScreenshotStore {
    tx: Transaction<'static, Postgres>,
}

impl PgScreenshotStore {
    pub async fn begin(pool: &PgPool) -> Result<Self, CoreError> {
        let tx = pool.begin().await.map_err(map_db_error)?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(map_db_error)
    }
}

#[async_trait]
impl ScreenshotStore for PgScreenshotStore {
    async fn files(&mut self, id: DbId) -> Result<Option<ScreenshotFiles>, CoreError> {
        // Row lock: concurrent saves of one screenshot see each other's files.
        let row = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "SELECT image_path, miniature_path FROM vn_screenshots WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(|(image, miniature)| ScreenshotFiles { image, miniature }))
    }

    async fn write_record(
        &mut self,
        draft: &ScreenshotDraft,
        miniature: Option<&str>,
    ) -> Result<DbId, CoreError> {
        match draft.id {
            None => sqlx::query_scalar::<_, DbId>(
                "INSERT INTO vn_screenshots \
                    (visual_novel_id, title, image_path, miniature_path, is_published) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(draft.visual_novel_id)
            .bind(&draft.title)
            .bind(&draft.image)
            .bind(miniature)
            .bind(draft.is_published)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_error),
            Some(id) => sqlx::query_scalar::<_, DbId>(
                "UPDATE vn_screenshots SET \
                    visual_novel_id = $2, title = $3, image_path = $4, \
                    miniature_path = $5, is_published = $6 \
                 WHERE id = $1 RETURNING id",
            )
            .bind(id)
            .bind(draft.visual_novel_id)
            .bind(&draft.title)
            .bind(&draft.image)
            .bind(miniature)
            .bind(draft.is_published)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?
            .ok_or(CoreError::NotFound {
                entity: "screenshot",
                id,
            }),
        }
    }

    async fn set_miniature(&mut self, id: DbId, miniature: Option<&str>) -> Result<(), CoreError> {
        let result = sqlx::query("UPDATE vn_screenshots SET miniature_path = $2 WHERE id = $1")
            .bind(id)
            .bind(miniature)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                entity: "screenshot",
                id,
            });
        }
        Ok(())
    }

    async fn unpublish(&mut self, id: DbId) -> Result<bool, CoreError> {
        let result = sqlx::query("UPDATE vn_screenshots SET is_published = false WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&mut self, id: DbId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM vn_screenshots WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
