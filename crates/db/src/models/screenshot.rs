//! Screenshot models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use vnt_core::screenshots::{ScreenshotDraft, ScreenshotFiles};
use vnt_core::types::{DbId, Timestamp};

/// A row from the `vn_screenshots` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Screenshot {
    pub id: DbId,
    pub visual_novel_id: Option<DbId>,
    pub title: Option<String>,
    pub image_path: Option<String>,
    pub miniature_path: Option<String>,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Screenshot {
    pub fn files(&self) -> ScreenshotFiles {
        ScreenshotFiles {
            image: self.image_path.clone(),
            miniature: self.miniature_path.clone(),
        }
    }
}

/// DTO for saving a screenshot. `image_path` is the stored path returned
/// by the screenshot upload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SaveScreenshot {
    pub visual_novel_id: Option<DbId>,
    #[validate(length(max = 256))]
    pub title: Option<String>,
    pub image_path: Option<String>,
    pub is_published: Option<bool>,
}

impl SaveScreenshot {
    /// Draft for the screenshot lifecycle; `id == None` creates a new row.
    /// A blank `image_path` means no image.
    pub fn into_draft(self, id: Option<DbId>) -> ScreenshotDraft {
        ScreenshotDraft {
            id,
            visual_novel_id: self.visual_novel_id,
            title: self.title,
            image: self.image_path.filter(|path| !path.trim().is_empty()),
            is_published: self.is_published.unwrap_or(true),
        }
    }
}
