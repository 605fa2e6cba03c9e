//! Visual novel models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use vnt_core::types::{DbId, Timestamp};

/// A row from the `visual_novels` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VisualNovel {
    pub id: DbId,
    pub title: String,
    pub alternative_title: String,
    pub description: String,
    pub poster_path: String,
    pub date_of_release: NaiveDate,
    pub vndb_id: i32,
    pub steam_link: Option<String>,
    pub longevity_id: Option<DbId>,
    pub alias: String,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a visual novel. `poster_path` is the stored path
/// returned by the poster upload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVisualNovel {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 500))]
    pub alternative_title: Option<String>,
    #[validate(length(max = 8000))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub poster_path: String,
    pub date_of_release: NaiveDate,
    pub vndb_id: i32,
    #[validate(length(max = 400))]
    pub steam_link: Option<String>,
    pub longevity_id: Option<DbId>,
    #[validate(length(max = 30))]
    pub alias: Option<String>,
    pub is_published: Option<bool>,
}

/// DTO for updating a visual novel. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVisualNovel {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub alternative_title: Option<String>,
    #[validate(length(max = 8000))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub poster_path: Option<String>,
    pub date_of_release: Option<NaiveDate>,
    pub vndb_id: Option<i32>,
    #[validate(length(max = 400))]
    pub steam_link: Option<String>,
    pub longevity_id: Option<DbId>,
    #[validate(length(max = 30))]
    pub alias: Option<String>,
}
