//! Catalog entity models: longevities, genres, tags, studios, staff and
//! staff roles, plus the weighted associations linking them to novels.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use vnt_core::types::{DbId, Timestamp};

/// The simple catalog tables. They all share the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Longevity,
    Genre,
    Tag,
    Studio,
    Staff,
    StaffRole,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 6] = [
        CatalogKind::Longevity,
        CatalogKind::Genre,
        CatalogKind::Tag,
        CatalogKind::Studio,
        CatalogKind::Staff,
        CatalogKind::StaffRole,
    ];

    pub fn table(self) -> &'static str {
        match self {
            CatalogKind::Longevity => "longevities",
            CatalogKind::Genre => "genres",
            CatalogKind::Tag => "tags",
            CatalogKind::Studio => "studios",
            CatalogKind::Staff => "staff",
            CatalogKind::StaffRole => "staff_roles",
        }
    }

    /// Entity name used in `NotFound` errors.
    pub fn entity(self) -> &'static str {
        match self {
            CatalogKind::Longevity => "longevity",
            CatalogKind::Genre => "genre",
            CatalogKind::Tag => "tag",
            CatalogKind::Studio => "studio",
            CatalogKind::Staff => "staff",
            CatalogKind::StaffRole => "staff role",
        }
    }
}

/// A row from any of the simple catalog tables.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CatalogEntry {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a catalog entry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCatalogEntry {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// DTO for updating a catalog entry. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCatalogEntry {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Weighted association tables with a single catalog column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Genre,
    Tag,
    Studio,
}

impl AssociationKind {
    pub fn table(self) -> &'static str {
        match self {
            AssociationKind::Genre => "vn_genres",
            AssociationKind::Tag => "vn_tags",
            AssociationKind::Studio => "vn_studios",
        }
    }

    /// Column on the association table referencing the catalog entity.
    pub fn target_column(self) -> &'static str {
        match self {
            AssociationKind::Genre => "genre_id",
            AssociationKind::Tag => "tag_id",
            AssociationKind::Studio => "studio_id",
        }
    }

    pub fn target(self) -> CatalogKind {
        match self {
            AssociationKind::Genre => CatalogKind::Genre,
            AssociationKind::Tag => CatalogKind::Tag,
            AssociationKind::Studio => CatalogKind::Studio,
        }
    }
}

/// A catalog entity attached to a novel, with the association weight.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeightedEntry {
    pub association_id: DbId,
    pub entry_id: DbId,
    pub title: String,
    pub weight: i32,
}

/// A staff member credited on a novel in one role.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StaffCredit {
    pub association_id: DbId,
    pub staff_id: DbId,
    pub staff_title: String,
    pub role_id: DbId,
    pub role_title: String,
    pub weight: i32,
}
