//! Miniature rendering.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::CoreError;

/// Size of a miniature `target_width` pixels wide with the original aspect
/// ratio. Images already narrower than the target keep their size.
pub fn miniature_size(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    if width == 0 || width <= target_width {
        return (width, height);
    }
    let scaled = u64::from(target_width) * u64::from(height) / u64::from(width);
    let scaled = u32::try_from(scaled).unwrap_or(u32::MAX).max(1);
    (target_width, scaled)
}

/// Decode `original`, downscale it to `target_width` and encode the result
/// in the format implied by `output_path` (falling back to the original's
/// format when the extension is unknown).
pub fn render_miniature(
    original: &[u8],
    output_path: &str,
    target_width: u32,
) -> Result<Vec<u8>, CoreError> {
    let format = ImageFormat::from_path(output_path)
        .or_else(|_| image::guess_format(original))
        .map_err(|e| CoreError::Image(format!("{output_path}: {e}")))?;

    let decoded = image::load_from_memory(original)
        .map_err(|e| CoreError::Image(format!("cannot decode original: {e}")))?;

    let (width, height) = miniature_size(decoded.width(), decoded.height(), target_width);
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Lanczos3)
    };

    // JPEG has no alpha channel.
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| CoreError::Image(format!("cannot encode {output_path}: {e}")))?;
    Ok(out.into_inner())
}

/// [`render_miniature`] on the blocking thread pool.
pub async fn render_miniature_blocking(
    original: Vec<u8>,
    output_path: String,
    target_width: u32,
) -> Result<Vec<u8>, CoreError> {
    tokio::task::spawn_blocking(move || render_miniature(&original, &output_path, target_width))
        .await
        .map_err(|e| CoreError::Internal(format!("miniature task failed: {e}")))?
}
