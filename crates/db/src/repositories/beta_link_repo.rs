//! Repository for `translation_beta_links`.

use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_core::types::DbId;
use vnt_core::validation::validate_input;

use crate::error::{found, map_db_error};
use crate::models::beta_link::{BetaLink, CreateBetaLink};

/// Column list for translation_beta_links queries.
const COLUMNS: &str =
    "id, translation_item_id, title, url, comment, is_published, created_at, updated_at";

pub struct BetaLinkRepo;

impl BetaLinkRepo {
    pub async fn create(pool: &PgPool, input: &CreateBetaLink) -> Result<BetaLink, CoreError> {
        validate_input(input)?;
        let query = format!(
            "INSERT INTO translation_beta_links \
                (translation_item_id, title, url, comment, is_published) \
             VALUES ($1, COALESCE($2, ''), $3, COALESCE($4, ''), COALESCE($5, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BetaLink>(&query)
            .bind(input.translation_item_id)
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.comment)
            .bind(input.is_published)
            .fetch_one(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<BetaLink, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM translation_beta_links WHERE id = $1");
        let row = sqlx::query_as::<_, BetaLink>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "beta link", id)
    }

    /// Links of an item, newest first; unpublished ones only when
    /// `include_unpublished`.
    pub async fn list_for_item(
        pool: &PgPool,
        translation_item_id: DbId,
        include_unpublished: bool,
    ) -> Result<Vec<BetaLink>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM translation_beta_links \
             WHERE translation_item_id = $1 AND (is_published OR $2) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, BetaLink>(&query)
            .bind(translation_item_id)
            .bind(include_unpublished)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    /// Without `force` the link is only unpublished; with `force` the row is
    /// removed. Returns `false` if no row matched.
    pub async fn delete(pool: &PgPool, id: DbId, force: bool) -> Result<bool, CoreError> {
        let sql = if force {
            "DELETE FROM translation_beta_links WHERE id = $1"
        } else {
            "UPDATE translation_beta_links SET is_published = false WHERE id = $1"
        };
        let result = sqlx::query(sql)
            .bind(id)
            .execute(pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
