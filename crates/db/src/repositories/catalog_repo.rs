//! Repository for the simple catalog tables and the weighted
//! novel associations.

use sqlx::PgPool;
use vnt_core::catalog::{validate_weight, DEFAULT_WEIGHT};
use vnt_core::error::CoreError;
use vnt_core::types::DbId;
use vnt_core::validation::{require_non_blank, validate_input};

use crate::error::{found, map_db_error};
use crate::models::catalog::{
    AssociationKind, CatalogEntry, CatalogKind, CreateCatalogEntry, StaffCredit,
    UpdateCatalogEntry, WeightedEntry,
};

/// Column list shared by every catalog table.
const COLUMNS: &str = "id, title, description, created_at, updated_at";

/// CRUD for catalog entries plus attach/detach on novels.
pub struct CatalogRepo;

impl CatalogRepo {
    /// Create an entry in the table for `kind`.
    pub async fn create(
        pool: &PgPool,
        kind: CatalogKind,
        input: &CreateCatalogEntry,
    ) -> Result<CatalogEntry, CoreError> {
        validate_input(input)?;
        require_non_blank("title", &input.title)?;
        let query = format!(
            "INSERT INTO {table} (title, description) VALUES ($1, COALESCE($2, '')) \
             RETURNING {COLUMNS}",
            table = kind.table()
        );
        sqlx::query_as::<_, CatalogEntry>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_one(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        kind: CatalogKind,
        id: DbId,
    ) -> Result<CatalogEntry, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", kind.table());
        let row = sqlx::query_as::<_, CatalogEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, kind.entity(), id)
    }

    /// All entries of `kind`, alphabetically.
    pub async fn list(pool: &PgPool, kind: CatalogKind) -> Result<Vec<CatalogEntry>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM {} ORDER BY title, id",
            kind.table()
        );
        sqlx::query_as::<_, CatalogEntry>(&query)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    pub async fn update(
        pool: &PgPool,
        kind: CatalogKind,
        id: DbId,
        input: &UpdateCatalogEntry,
    ) -> Result<CatalogEntry, CoreError> {
        validate_input(input)?;
        if let Some(title) = &input.title {
            require_non_blank("title", title)?;
        }
        let query = format!(
            "UPDATE {table} SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description) \
             WHERE id = $1 RETURNING {COLUMNS}",
            table = kind.table()
        );
        let row = sqlx::query_as::<_, CatalogEntry>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, kind.entity(), id)
    }

    /// Delete an entry. Fails with [`CoreError::ReferentialConflict`] while
    /// a novel still uses it. Returns `false` if no row matched.
    pub async fn delete(pool: &PgPool, kind: CatalogKind, id: DbId) -> Result<bool, CoreError> {
        let query = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&query)
            .bind(id)
            .execute(pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Associations
    // -----------------------------------------------------------------------

    /// Attach an entry to a novel, or change the weight of an existing
    /// attachment. `None` uses the default weight.
    pub async fn attach(
        pool: &PgPool,
        kind: AssociationKind,
        visual_novel_id: DbId,
        entry_id: DbId,
        weight: Option<i32>,
    ) -> Result<DbId, CoreError> {
        let weight = weight.unwrap_or(DEFAULT_WEIGHT);
        validate_weight(weight)?;
        let query = format!(
            "INSERT INTO {table} (visual_novel_id, {column}, weight) VALUES ($1, $2, $3) \
             ON CONFLICT (visual_novel_id, {column}) DO UPDATE SET weight = EXCLUDED.weight \
             RETURNING id",
            table = kind.table(),
            column = kind.target_column()
        );
        let id = sqlx::query_scalar::<_, DbId>(&query)
            .bind(visual_novel_id)
            .bind(entry_id)
            .bind(weight)
            .fetch_one(pool)
            .await
            .map_err(map_db_error)?;

        tracing::debug!(
            table = kind.table(),
            visual_novel_id,
            entry_id,
            weight,
            "Attached catalog entry"
        );
        Ok(id)
    }

    /// Returns `false` if the entry was not attached.
    pub async fn detach(
        pool: &PgPool,
        kind: AssociationKind,
        visual_novel_id: DbId,
        entry_id: DbId,
    ) -> Result<bool, CoreError> {
        let query = format!(
            "DELETE FROM {table} WHERE visual_novel_id = $1 AND {column} = $2",
            table = kind.table(),
            column = kind.target_column()
        );
        let result = sqlx::query(&query)
            .bind(visual_novel_id)
            .bind(entry_id)
            .execute(pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Entries attached to a novel, heaviest first.
    pub async fn list_attached(
        pool: &PgPool,
        kind: AssociationKind,
        visual_novel_id: DbId,
    ) -> Result<Vec<WeightedEntry>, CoreError> {
        let query = format!(
            "SELECT a.id AS association_id, e.id AS entry_id, e.title, a.weight \
             FROM {table} a JOIN {target} e ON e.id = a.{column} \
             WHERE a.visual_novel_id = $1 \
             ORDER BY a.weight DESC, e.title, e.id",
            table = kind.table(),
            target = kind.target().table(),
            column = kind.target_column()
        );
        sqlx::query_as::<_, WeightedEntry>(&query)
            .bind(visual_novel_id)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    /// Credit a staff member in a role, or change the weight of that credit.
    pub async fn attach_staff(
        pool: &PgPool,
        visual_novel_id: DbId,
        staff_id: DbId,
        role_id: DbId,
        weight: Option<i32>,
    ) -> Result<DbId, CoreError> {
        let weight = weight.unwrap_or(DEFAULT_WEIGHT);
        validate_weight(weight)?;
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO vn_staff (visual_novel_id, staff_id, role_id, weight) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (visual_novel_id, staff_id, role_id) \
             DO UPDATE SET weight = EXCLUDED.weight \
             RETURNING id",
        )
        .bind(visual_novel_id)
        .bind(staff_id)
        .bind(role_id)
        .bind(weight)
        .fetch_one(pool)
        .await
        .map_err(map_db_error)
    }

    pub async fn detach_staff(
        pool: &PgPool,
        visual_novel_id: DbId,
        staff_id: DbId,
        role_id: DbId,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "DELETE FROM vn_staff WHERE visual_novel_id = $1 AND staff_id = $2 AND role_id = $3",
        )
        .bind(visual_novel_id)
        .bind(staff_id)
        .bind(role_id)
        .execute(pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Staff credits of a novel, heaviest first.
    pub async fn list_staff(
        pool: &PgPool,
        visual_novel_id: DbId,
    ) -> Result<Vec<StaffCredit>, CoreError> {
        sqlx::query_as::<_, StaffCredit>(
            "SELECT a.id AS association_id, s.id AS staff_id, s.title AS staff_title, \
                    r.id AS role_id, r.title AS role_title, a.weight \
             FROM vn_staff a \
             JOIN staff s ON s.id = a.staff_id \
             JOIN staff_roles r ON r.id = a.role_id \
             WHERE a.visual_novel_id = $1 \
             ORDER BY a.weight DESC, s.title, r.title, a.id",
        )
        .bind(visual_novel_id)
        .fetch_all(pool)
        .await
        .map_err(map_db_error)
    }
}
