//! Mapping of driver errors onto the domain error taxonomy.

use vnt_core::delete_policy;
use vnt_core::error::CoreError;

/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Convert a `sqlx` error into a [`CoreError`].
///
/// - foreign-key violations on delete become [`CoreError::ReferentialConflict`],
///   on insert/update [`CoreError::Validation`]
/// - unique violations become [`CoreError::Conflict`]
/// - check violations become [`CoreError::Validation`]
/// - everything else is logged and becomes [`CoreError::Internal`]
pub fn map_db_error(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                // Inserts pointing at a missing row trip the same constraint
                // as deletes of a still-referenced row.
                Some(FOREIGN_KEY_VIOLATION) if db_err.message().starts_with("insert or update") => {
                    CoreError::Validation(format!(
                        "Referenced row does not exist ({constraint})"
                    ))
                }
                Some(FOREIGN_KEY_VIOLATION) => delete_policy::referential_conflict(constraint),
                Some(UNIQUE_VIOLATION) => CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                )),
                Some(CHECK_VIOLATION) => CoreError::Validation(format!(
                    "Value violates check constraint: {constraint}"
                )),
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    CoreError::Internal(db_err.to_string())
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Internal(other.to_string())
        }
    }
}

/// Turn a missing row into [`CoreError::NotFound`].
pub fn found<T>(row: Option<T>, entity: &'static str, id: i64) -> Result<T, CoreError> {
    row.ok_or(CoreError::NotFound { entity, id })
}
