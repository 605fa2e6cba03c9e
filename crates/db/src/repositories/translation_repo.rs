//! Repository for `translation_items` and their moderators.
//!
//! A translation item always comes with its own statistics tree: the tree
//! row, its root chapter and the item are created in one transaction and
//! removed together in one transaction.

use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_core::statistics::ROOT_TITLE;
use vnt_core::types::DbId;

use crate::error::{found, map_db_error};
use crate::models::identity::User;
use crate::models::translation::{CreateTranslationItem, TranslationItem};

/// Column list for translation_items queries.
const COLUMNS: &str = "id, visual_novel_id, statistics_id, is_published, created_at, updated_at";

/// Provides CRUD operations for translation items.
pub struct TranslationRepo;

impl TranslationRepo {
    /// Create a translation item together with a fresh statistics tree and
    /// its root chapter.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTranslationItem,
    ) -> Result<TranslationItem, CoreError> {
        let mut tx = pool.begin().await.map_err(map_db_error)?;

        let tree_id = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO statistics_trees DEFAULT VALUES RETURNING id",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO statistics_chapters (tree_id, parent_id, title, script_title, is_chapter) \
             VALUES ($1, NULL, $2, $2, true)",
        )
        .bind(tree_id)
        .bind(ROOT_TITLE)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let query = format!(
            "INSERT INTO translation_items (visual_novel_id, statistics_id, is_published) \
             VALUES ($1, $2, COALESCE($3, true)) \
             RETURNING {COLUMNS}"
        );
        let item = sqlx::query_as::<_, TranslationItem>(&query)
            .bind(input.visual_novel_id)
            .bind(tree_id)
            .bind(input.is_published)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            translation_item_id = item.id,
            visual_novel_id = item.visual_novel_id,
            tree_id,
            "Created translation item"
        );
        Ok(item)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<TranslationItem, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM translation_items WHERE id = $1");
        let row = sqlx::query_as::<_, TranslationItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "translation item", id)
    }

    /// Items ordered by creation; unpublished ones only when `include_unpublished`.
    pub async fn list(
        pool: &PgPool,
        include_unpublished: bool,
    ) -> Result<Vec<TranslationItem>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM translation_items \
             WHERE is_published OR $1 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, TranslationItem>(&query)
            .bind(include_unpublished)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn list_for_visual_novel(
        pool: &PgPool,
        visual_novel_id: DbId,
    ) -> Result<Vec<TranslationItem>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM translation_items \
             WHERE visual_novel_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, TranslationItem>(&query)
            .bind(visual_novel_id)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn set_published(
        pool: &PgPool,
        id: DbId,
        is_published: bool,
    ) -> Result<TranslationItem, CoreError> {
        let query = format!(
            "UPDATE translation_items SET is_published = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TranslationItem>(&query)
            .bind(id)
            .bind(is_published)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "translation item", id)
    }

    /// Delete an item together with its statistics tree. Subscriptions and
    /// moderator rows go with it; a beta link still pointing at the item
    /// rolls the whole delete back with [`CoreError::ReferentialConflict`].
    ///
    /// Returns `false` if no item with `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, CoreError> {
        let mut tx = pool.begin().await.map_err(map_db_error)?;

        let tree_id = sqlx::query_scalar::<_, Option<DbId>>(
            "SELECT statistics_id FROM translation_items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some(tree_id) = tree_id else {
            return Ok(false);
        };

        let mut nodes_removed = 0;
        if let Some(tree_id) = tree_id {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(tree_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;

            nodes_removed = sqlx::query("DELETE FROM statistics_chapters WHERE tree_id = $1")
                .bind(tree_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?
                .rows_affected();

            sqlx::query("DELETE FROM statistics_trees WHERE id = $1")
                .bind(tree_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        sqlx::query("DELETE FROM translation_items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            translation_item_id = id,
            tree_id = ?tree_id,
            nodes_removed,
            "Deleted translation item"
        );
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Moderators
    // -----------------------------------------------------------------------

    /// Grant `user_id` moderation of an item. Returns `false` if they
    /// already had it.
    pub async fn add_moderator(
        pool: &PgPool,
        translation_item_id: DbId,
        user_id: DbId,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "INSERT INTO translation_moderators (translation_item_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (translation_item_id, user_id) DO NOTHING",
        )
        .bind(translation_item_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_moderator(
        pool: &PgPool,
        translation_item_id: DbId,
        user_id: DbId,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "DELETE FROM translation_moderators WHERE translation_item_id = $1 AND user_id = $2",
        )
        .bind(translation_item_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_moderators(
        pool: &PgPool,
        translation_item_id: DbId,
    ) -> Result<Vec<User>, CoreError> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.created_at, u.updated_at \
             FROM translation_moderators m JOIN users u ON u.id = m.user_id \
             WHERE m.translation_item_id = $1 \
             ORDER BY u.username",
        )
        .bind(translation_item_id)
        .fetch_all(pool)
        .await
        .map_err(map_db_error)
    }

    pub async fn is_moderator(
        pool: &PgPool,
        translation_item_id: DbId,
        user_id: DbId,
    ) -> Result<bool, CoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM translation_moderators \
                            WHERE translation_item_id = $1 AND user_id = $2)",
        )
        .bind(translation_item_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(map_db_error)
    }
}
