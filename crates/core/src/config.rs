//! Media configuration.
//!
//! Directory policy for stored images: posters, screenshots and screenshot
//! miniatures each live in their own directory below `media_root`.

use std::path::PathBuf;

use crate::error::CoreError;

/// Default width of a generated screenshot miniature, in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 150;

/// Where images are stored and how large miniatures are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// Filesystem root every relative media path is resolved against.
    pub media_root: PathBuf,
    /// Directory (relative to `media_root`) for visual-novel posters.
    pub poster_dir: String,
    /// Directory (relative to `media_root`) for screenshot originals.
    pub screenshot_dir: String,
    /// Directory (relative to `media_root`) for screenshot miniatures.
    pub screenshot_mini_dir: String,
    /// Target miniature width in pixels.
    pub thumbnail_width: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            poster_dir: "vn/posters".into(),
            screenshot_dir: "vn/screenshots".into(),
            screenshot_mini_dir: "vn/screenshots/mini".into(),
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                               | Default               |
    /// |---------------------------------------|-----------------------|
    /// | `MEDIA_ROOT`                          | `media`               |
    /// | `MEDIA_VN_POSTER_DIRECTORY`           | `vn/posters`          |
    /// | `MEDIA_VN_SCREENSHOTS_DIRECTORY`      | `vn/screenshots`      |
    /// | `MEDIA_VN_SCREENSHOTS_MINI_DIRECTORY` | `vn/screenshots/mini` |
    /// | `SCREENSHOT_MINIATURE_WIDTH`          | `150`                 |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MediaConfig::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let media_root = lookup("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.media_root);
        let poster_dir = lookup("MEDIA_VN_POSTER_DIRECTORY").unwrap_or(defaults.poster_dir);
        let screenshot_dir =
            lookup("MEDIA_VN_SCREENSHOTS_DIRECTORY").unwrap_or(defaults.screenshot_dir);
        let screenshot_mini_dir = lookup("MEDIA_VN_SCREENSHOTS_MINI_DIRECTORY")
            .unwrap_or(defaults.screenshot_mini_dir);

        let thumbnail_width = match lookup("SCREENSHOT_MINIATURE_WIDTH") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                CoreError::Validation(format!(
                    "SCREENSHOT_MINIATURE_WIDTH must be a positive integer, got '{raw}'"
                ))
            })?,
            None => defaults.thumbnail_width,
        };
        if thumbnail_width == 0 {
            return Err(CoreError::Validation(
                "SCREENSHOT_MINIATURE_WIDTH must be greater than zero".into(),
            ));
        }

        Ok(Self {
            media_root,
            poster_dir,
            screenshot_dir,
            screenshot_mini_dir,
            thumbnail_width,
        })
    }

    /// All directories that must exist below `media_root`.
    pub fn directories(&self) -> [&str; 3] {
        [
            self.poster_dir.as_str(),
            self.screenshot_dir.as_str(),
            self.screenshot_mini_dir.as_str(),
        ]
    }
}
