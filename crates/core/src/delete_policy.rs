//! Per-relation delete policies.
//!
//! Every foreign key in the schema is listed in [`RELATIONS`] together with
//! what happens to the referencing row when the referenced row is deleted.
//! The SQL migrations declare the same rules; a schema test in `vnt-db`
//! checks the two never drift apart. Constraint names follow
//! `fk_{table}_{column}` so a violated constraint reported by the database
//! can be mapped back to its relation.

use crate::error::CoreError;

/// What the database does to referencing rows when a referenced row goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Referencing rows are deleted too.
    Cascade,
    /// The delete is refused while referencing rows exist.
    Restrict,
    /// The referencing column is cleared.
    SetNull,
}

impl DeletePolicy {
    /// The SQL `ON DELETE` action for this policy.
    pub fn sql_action(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
        }
    }

    /// Parse a `delete_rule` value from `information_schema.referential_constraints`.
    pub fn from_sql_action(action: &str) -> Result<Self, CoreError> {
        match action {
            "CASCADE" => Ok(Self::Cascade),
            "RESTRICT" => Ok(Self::Restrict),
            "SET NULL" => Ok(Self::SetNull),
            other => Err(CoreError::Validation(format!(
                "Unsupported delete rule '{other}'"
            ))),
        }
    }
}

/// One foreign-key relation of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Referencing table.
    pub table: &'static str,
    /// Referencing column.
    pub column: &'static str,
    /// Referenced table.
    pub references: &'static str,
    pub policy: DeletePolicy,
}

impl Relation {
    /// Name of the foreign-key constraint declared for this relation.
    pub fn constraint_name(&self) -> String {
        format!("fk_{}_{}", self.table, self.column)
    }
}

const fn rel(
    table: &'static str,
    column: &'static str,
    references: &'static str,
    policy: DeletePolicy,
) -> Relation {
    Relation {
        table,
        column,
        references,
        policy,
    }
}

use DeletePolicy::{Cascade, Restrict, SetNull};

/// Every foreign key of the schema.
pub const RELATIONS: &[Relation] = &[
    // Catalog
    rel("visual_novels", "longevity_id", "longevities", Restrict),
    rel("vn_genres", "visual_novel_id", "visual_novels", Cascade),
    rel("vn_genres", "genre_id", "genres", Restrict),
    rel("vn_tags", "visual_novel_id", "visual_novels", Cascade),
    rel("vn_tags", "tag_id", "tags", Restrict),
    rel("vn_studios", "visual_novel_id", "visual_novels", Cascade),
    rel("vn_studios", "studio_id", "studios", Restrict),
    rel("vn_staff", "visual_novel_id", "visual_novels", Cascade),
    rel("vn_staff", "staff_id", "staff", Restrict),
    rel("vn_staff", "role_id", "staff_roles", Restrict),
    rel("vn_screenshots", "visual_novel_id", "visual_novels", SetNull),
    // Identity
    rel("profiles", "user_id", "users", Cascade),
    // Translation statistics
    rel("statistics_chapters", "tree_id", "statistics_trees", Cascade),
    rel("statistics_chapters", "parent_id", "statistics_chapters", Cascade),
    rel("translation_items", "visual_novel_id", "visual_novels", Restrict),
    rel("translation_items", "statistics_id", "statistics_trees", SetNull),
    rel("translation_moderators", "translation_item_id", "translation_items", Cascade),
    rel("translation_moderators", "user_id", "users", Cascade),
    rel("translation_subscriptions", "translation_item_id", "translation_items", Cascade),
    rel("translation_subscriptions", "profile_id", "profiles", Cascade),
    rel("translation_beta_links", "translation_item_id", "translation_items", Restrict),
];

/// Find the relation declared under `constraint`.
pub fn relation_by_constraint(constraint: &str) -> Option<&'static Relation> {
    RELATIONS
        .iter()
        .find(|r| r.constraint_name() == constraint)
}

/// Relations that reference `table`, i.e. what a delete from `table` touches.
pub fn referencing(table: &str) -> impl Iterator<Item = &'static Relation> + '_ {
    RELATIONS.iter().filter(move |r| r.references == table)
}

/// Build the error for a delete refused by a restricting relation.
///
/// Falls back to the raw constraint name when it is not one of ours.
pub fn referential_conflict(constraint: &str) -> CoreError {
    match relation_by_constraint(constraint) {
        Some(relation) => CoreError::ReferentialConflict {
            entity: relation.references.to_string(),
            constraint: format!("referenced by {}.{}", relation.table, relation.column),
        },
        None => CoreError::ReferentialConflict {
            entity: "record".to_string(),
            constraint: constraint.to_string(),
        },
    }
}
