//! Repository for the `visual_novels` table.

use sqlx::PgPool;
use vnt_core::catalog::{validate_store_link, validate_vndb_id};
use vnt_core::error::CoreError;
use vnt_core::types::DbId;
use vnt_core::validation::{require_non_blank, validate_input};

use crate::error::{found, map_db_error};
use crate::models::visual_novel::{CreateVisualNovel, UpdateVisualNovel, VisualNovel};

/// Column list for visual_novels queries.
const COLUMNS: &str = "\
    id, title, alternative_title, description, poster_path, date_of_release, \
    vndb_id, steam_link, longevity_id, alias, is_published, created_at, updated_at";

/// Provides CRUD operations for visual novels.
pub struct VisualNovelRepo;

impl VisualNovelRepo {
    pub async fn create(pool: &PgPool, input: &CreateVisualNovel) -> Result<VisualNovel, CoreError> {
        validate_input(input)?;
        require_non_blank("title", &input.title)?;
        validate_vndb_id(input.vndb_id)?;
        validate_store_link(input.steam_link.as_deref())?;

        let query = format!(
            "INSERT INTO visual_novels \
                (title, alternative_title, description, poster_path, date_of_release, \
                 vndb_id, steam_link, longevity_id, alias, is_published) \
             VALUES ($1, COALESCE($2, ''), COALESCE($3, ''), $4, $5, $6, $7, $8, \
                     COALESCE($9, ''), COALESCE($10, true)) \
             RETURNING {COLUMNS}"
        );
        let novel = sqlx::query_as::<_, VisualNovel>(&query)
            .bind(&input.title)
            .bind(&input.alternative_title)
            .bind(&input.description)
            .bind(&input.poster_path)
            .bind(input.date_of_release)
            .bind(input.vndb_id)
            .bind(&input.steam_link)
            .bind(input.longevity_id)
            .bind(&input.alias)
            .bind(input.is_published)
            .fetch_one(pool)
            .await
            .map_err(map_db_error)?;

        tracing::info!(visual_novel_id = novel.id, title = %novel.title, "Created visual novel");
        Ok(novel)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<VisualNovel, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM visual_novels WHERE id = $1");
        let row = sqlx::query_as::<_, VisualNovel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "visual novel", id)
    }

    /// Novels ordered by title; unpublished ones only when `include_unpublished`.
    pub async fn list(
        pool: &PgPool,
        include_unpublished: bool,
    ) -> Result<Vec<VisualNovel>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM visual_novels \
             WHERE is_published OR $1 \
             ORDER BY title, id"
        );
        sqlx::query_as::<_, VisualNovel>(&query)
            .bind(include_unpublished)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    /// Update the given fields. `steam_link` and `longevity_id` cannot be
    /// cleared through this call.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVisualNovel,
    ) -> Result<VisualNovel, CoreError> {
        validate_input(input)?;
        if let Some(title) = &input.title {
            require_non_blank("title", title)?;
        }
        if let Some(vndb_id) = input.vndb_id {
            validate_vndb_id(vndb_id)?;
        }
        validate_store_link(input.steam_link.as_deref())?;

        let query = format!(
            "UPDATE visual_novels SET \
                title = COALESCE($2, title), \
                alternative_title = COALESCE($3, alternative_title), \
                description = COALESCE($4, description), \
                poster_path = COALESCE($5, poster_path), \
                date_of_release = COALESCE($6, date_of_release), \
                vndb_id = COALESCE($7, vndb_id), \
                steam_link = COALESCE($8, steam_link), \
                longevity_id = COALESCE($9, longevity_id), \
                alias = COALESCE($10, alias) \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, VisualNovel>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.alternative_title)
            .bind(&input.description)
            .bind(&input.poster_path)
            .bind(input.date_of_release)
            .bind(input.vndb_id)
            .bind(&input.steam_link)
            .bind(input.longevity_id)
            .bind(&input.alias)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "visual novel", id)
    }

    pub async fn set_published(
        pool: &PgPool,
        id: DbId,
        is_published: bool,
    ) -> Result<VisualNovel, CoreError> {
        let query = format!(
            "UPDATE visual_novels SET is_published = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, VisualNovel>(&query)
            .bind(id)
            .bind(is_published)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "visual novel", id)
    }

    /// Delete a novel together with its associations. Screenshots are
    /// detached; a translation item still pointing at it blocks the delete
    /// with [`CoreError::ReferentialConflict`].
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM visual_novels WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
