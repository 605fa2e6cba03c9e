//! Repositories for the `users` and `profiles` tables.

use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_core::types::DbId;
use vnt_core::validation::{require_non_blank, validate_input};

use crate::error::{found, map_db_error};
use crate::models::identity::{CreateUser, Profile, User};

/// Column list for users queries.
const USER_COLUMNS: &str = "id, username, email, created_at, updated_at";

/// Column list for profiles queries.
const PROFILE_COLUMNS: &str = "id, user_id, display_name, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    /// Create a user. A taken username is a [`CoreError::Conflict`].
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, CoreError> {
        validate_input(input)?;
        require_non_blank("username", &input.username)?;
        let query = format!(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .fetch_one(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<User, CoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "user", id)
    }

    /// Delete a user; their profile, moderator rows and subscriptions go too.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct ProfileRepo;

impl ProfileRepo {
    /// Create the profile of a user. A user has at most one.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        display_name: Option<&str>,
    ) -> Result<Profile, CoreError> {
        let query = format!(
            "INSERT INTO profiles (user_id, display_name) VALUES ($1, COALESCE($2, '')) \
             RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(display_name)
            .fetch_one(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_user(pool: &PgPool, user_id: DbId) -> Result<Option<Profile>, CoreError> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)
    }

    /// Delete a profile; its subscriptions go with it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
