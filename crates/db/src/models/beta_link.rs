//! Beta-patch download links.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use vnt_core::types::{DbId, Timestamp};

/// A row from the `translation_beta_links` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BetaLink {
    pub id: DbId,
    pub translation_item_id: Option<DbId>,
    pub title: String,
    pub url: String,
    pub comment: String,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a beta link.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBetaLink {
    pub translation_item_id: Option<DbId>,
    #[validate(length(max = 50))]
    pub title: Option<String>,
    #[validate(url, length(max = 200))]
    pub url: String,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub is_published: Option<bool>,
}
