//! Users and profiles. Only the columns moderators and subscribers need.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use vnt_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
}

/// A row from the `profiles` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: DbId,
    pub user_id: DbId,
    pub display_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
