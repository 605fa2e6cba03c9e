//! Image storage: stored-path conventions, uploads and miniature rendering.
//!
//! Stored paths are relative to the media root and always use `/`
//! separators, e.g. `vn/screenshots/opening.png`.

pub mod blob;
pub mod thumbnail;

pub use blob::{BlobStore, LocalBlobStore};

use crate::config::MediaConfig;
use crate::error::CoreError;

/// Final component of a stored path.
pub fn file_name(path: &str) -> Result<&str, CoreError> {
    let name = path.rsplit('/').next().unwrap_or_default();
    if name.trim().is_empty() {
        return Err(CoreError::InvalidReference(format!(
            "'{path}' does not name a file"
        )));
    }
    Ok(name)
}

/// Join a directory and a file name with a single `/`.
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Deterministic miniature location for a screenshot original: the
/// miniature directory plus the original's file name.
pub fn miniature_path(config: &MediaConfig, image_path: &str) -> Result<String, CoreError> {
    Ok(join(&config.screenshot_mini_dir, file_name(image_path)?))
}

/// Reduce an uploaded file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(name: &str) -> Result<String, CoreError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return Err(CoreError::InvalidReference(format!(
            "'{name}' is not a usable file name"
        )));
    }
    Ok(cleaned)
}

/// Name for the `index`-th collision: `shot.png`, `shot_1.png`, `shot_2.png`, ...
pub fn indexed_file_name(name: &str, index: u32) -> String {
    if index == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{index}.{ext}"),
        _ => format!("{name}_{index}"),
    }
}

/// Upper bound on collision suffixes tried by [`upload`].
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Store an uploaded file in `dir` under a name no other file uses yet.
/// Returns the stored path.
pub async fn upload<B>(
    store: &B,
    dir: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, CoreError>
where
    B: BlobStore + ?Sized,
{
    let name = sanitize_file_name(file_name)?;
    for index in 0..MAX_NAME_ATTEMPTS {
        let path = join(dir, &indexed_file_name(&name, index));
        if !store.exists(&path).await? {
            store.write(&path, bytes).await?;
            tracing::debug!(path = %path, size = bytes.len(), "Stored upload");
            return Ok(path);
        }
    }
    Err(CoreError::Conflict(format!(
        "No free file name for '{name}' in {dir}"
    )))
}

/// Delete a stored file if there is one. Missing files and empty references
/// are not errors; other storage failures are.
pub async fn delete_if_present<B>(store: &B, path: Option<&str>) -> Result<bool, CoreError>
where
    B: BlobStore + ?Sized,
{
    let Some(path) = path else {
        return Ok(false);
    };
    match store.delete(path).await {
        Ok(removed) => Ok(removed),
        Err(e) if e.is_missing() => {
            tracing::debug!(path, error = %e, "Nothing to delete");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
