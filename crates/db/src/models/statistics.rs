//! Statistics tree models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use vnt_core::statistics::{indented_label, ChapterLink, Counters};
use vnt_core::types::{DbId, Timestamp};

/// A row from the `statistics_trees` table. The counters mirror the root
/// node and are refreshed after every recalculation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatisticsTree {
    pub id: DbId,
    pub pictures_statistics: String,
    pub technical_statistics: String,
    pub comment: String,
    pub total_rows: i32,
    pub translated: i32,
    pub edited_first_pass: i32,
    pub edited_second_pass: i32,
    pub last_update: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StatisticsTree {
    pub fn counters(&self) -> Counters {
        Counters::new(
            self.total_rows,
            self.translated,
            self.edited_first_pass,
            self.edited_second_pass,
        )
    }
}

/// DTO for the free-text notes on a tree. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTreeNotes {
    #[validate(length(max = 500))]
    pub pictures_statistics: Option<String>,
    #[validate(length(max = 500))]
    pub technical_statistics: Option<String>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// A row from the `statistics_chapters` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatisticsNode {
    pub id: DbId,
    pub tree_id: DbId,
    pub parent_id: Option<DbId>,
    pub title: String,
    pub script_title: String,
    pub is_chapter: bool,
    pub total_rows: i32,
    pub translated: i32,
    pub edited_first_pass: i32,
    pub edited_second_pass: i32,
    pub last_update: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StatisticsNode {
    pub fn counters(&self) -> Counters {
        Counters::new(
            self.total_rows,
            self.translated,
            self.edited_first_pass,
            self.edited_second_pass,
        )
    }

    pub fn link(&self) -> ChapterLink {
        ChapterLink {
            id: self.id,
            tree_id: self.tree_id,
            parent_id: self.parent_id,
            is_chapter: self.is_chapter,
        }
    }
}

/// A node together with its depth below the root (root = 0), as returned
/// by the depth-first tree listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TreeNode {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub node: StatisticsNode,
    pub level: i32,
}

impl TreeNode {
    /// Select-box label, indented relative to `base_level`.
    pub fn label(&self, base_level: i32) -> String {
        indented_label(&self.node.script_title, self.level, base_level)
    }
}

/// DTO for adding a node below an existing chapter.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStatisticsNode {
    pub parent_id: DbId,
    #[validate(length(max = 50))]
    pub title: Option<String>,
    #[validate(length(max = 50))]
    pub script_title: Option<String>,
    pub is_chapter: bool,
    /// Raw counters for a leaf; ignored for chapters.
    pub counters: Option<Counters>,
}
