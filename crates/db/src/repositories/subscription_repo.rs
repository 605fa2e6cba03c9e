//! Repository for `translation_subscriptions`.

use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_core::types::DbId;

use crate::error::map_db_error;
use crate::models::identity::Profile;
use crate::models::translation::TranslationItem;

/// Profile/item subscription pairs. A pair exists at most once.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Subscribe a profile to an item. Returns `false` if it already was.
    pub async fn subscribe(
        pool: &PgPool,
        profile_id: DbId,
        translation_item_id: DbId,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "INSERT INTO translation_subscriptions (profile_id, translation_item_id) \
             VALUES ($1, $2) \
             ON CONFLICT (profile_id, translation_item_id) DO NOTHING",
        )
        .bind(profile_id)
        .bind(translation_item_id)
        .execute(pool)
        .await
        .map_err(map_db_error)?;

        let created = result.rows_affected() > 0;
        if created {
            tracing::debug!(profile_id, translation_item_id, "Subscribed");
        }
        Ok(created)
    }

    /// Returns `false` if there was no subscription.
    pub async fn unsubscribe(
        pool: &PgPool,
        profile_id: DbId,
        translation_item_id: DbId,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "DELETE FROM translation_subscriptions \
             WHERE profile_id = $1 AND translation_item_id = $2",
        )
        .bind(profile_id)
        .bind(translation_item_id)
        .execute(pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_subscribed(
        pool: &PgPool,
        profile_id: DbId,
        translation_item_id: DbId,
    ) -> Result<bool, CoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM translation_subscriptions \
                            WHERE profile_id = $1 AND translation_item_id = $2)",
        )
        .bind(profile_id)
        .bind(translation_item_id)
        .fetch_one(pool)
        .await
        .map_err(map_db_error)
    }

    /// Profiles subscribed to an item, oldest subscription first.
    pub async fn list_subscribers(
        pool: &PgPool,
        translation_item_id: DbId,
    ) -> Result<Vec<Profile>, CoreError> {
        sqlx::query_as::<_, Profile>(
            "SELECT p.id, p.user_id, p.display_name, p.created_at, p.updated_at \
             FROM translation_subscriptions s JOIN profiles p ON p.id = s.profile_id \
             WHERE s.translation_item_id = $1 \
             ORDER BY s.created_at, s.id",
        )
        .bind(translation_item_id)
        .fetch_all(pool)
        .await
        .map_err(map_db_error)
    }

    /// Items a profile is subscribed to, oldest subscription first.
    pub async fn list_subscriptions(
        pool: &PgPool,
        profile_id: DbId,
    ) -> Result<Vec<TranslationItem>, CoreError> {
        sqlx::query_as::<_, TranslationItem>(
            "SELECT t.id, t.visual_novel_id, t.statistics_id, t.is_published, \
                    t.created_at, t.updated_at \
             FROM translation_subscriptions s JOIN translation_items t ON t.id = s.translation_item_id \
             WHERE s.profile_id = $1 \
             ORDER BY s.created_at, s.id",
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .map_err(map_db_error)
    }
}
