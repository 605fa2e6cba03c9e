//! Translation items, moderators and subscriptions.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vnt_core::types::{DbId, Timestamp};

/// A row from the `translation_items` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TranslationItem {
    pub id: DbId,
    pub visual_novel_id: DbId,
    /// Statistics tree id; `None` only after the tree was removed on its own.
    pub statistics_id: Option<DbId>,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a translation item. The statistics tree is created
/// alongside it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTranslationItem {
    pub visual_novel_id: DbId,
    pub is_published: Option<bool>,
}

/// A row from the `translation_subscriptions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TranslationSubscription {
    pub id: DbId,
    pub profile_id: DbId,
    pub translation_item_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
