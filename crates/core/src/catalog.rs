//! Catalog rules: association weights and external identifiers.

use crate::error::CoreError;

/// Weight given to an association when the caller does not pick one.
pub const DEFAULT_WEIGHT: i32 = 0;

/// Association weights rank genres, tags, studios and staff on a novel.
/// Higher weight sorts first; negative weights are not allowed.
pub fn validate_weight(weight: i32) -> Result<(), CoreError> {
    if weight < 0 {
        return Err(CoreError::Validation(format!(
            "Association weight must be non-negative, got {weight}"
        )));
    }
    Ok(())
}

/// VNDb identifiers are positive integers (`v17` is stored as `17`).
pub fn validate_vndb_id(vndb_id: i32) -> Result<(), CoreError> {
    if vndb_id <= 0 {
        return Err(CoreError::Validation(format!(
            "VNDb id must be positive, got {vndb_id}"
        )));
    }
    Ok(())
}

/// Steam links, when present, must be absolute http(s) URLs.
pub fn validate_store_link(link: Option<&str>) -> Result<(), CoreError> {
    match link {
        None => Ok(()),
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => Ok(()),
        Some(url) => Err(CoreError::Validation(format!(
            "Store link must be an http(s) URL, got '{url}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights() {
        assert!(validate_weight(DEFAULT_WEIGHT).is_ok());
        assert!(validate_weight(100).is_ok());
        assert!(validate_weight(-1).is_err());
    }

    #[test]
    fn vndb_ids() {
        assert!(validate_vndb_id(17).is_ok());
        assert!(validate_vndb_id(0).is_err());
    }

    #[test]
    fn store_links() {
        assert!(validate_store_link(None).is_ok());
        assert!(validate_store_link(Some("https://store.steampowered.com/app/1")).is_ok());
        assert!(validate_store_link(Some("steam://run/1")).is_err());
    }
}
