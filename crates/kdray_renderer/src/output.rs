//! Writing finished frames to disk.

use std::io;
use std::path::Path;

use image::ImageFormat;
use kdray_core::{Image, SceneError};
use thiserror::Error;

/// Display gamma applied when writing 8-bit files.
pub const DEFAULT_GAMMA: f64 = 2.2;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Output format for `path`, chosen by its extension.
pub fn output_format(path: &Path) -> Result<ImageFormat, RenderError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        _ => Err(RenderError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Save `img` as PNG or JPEG, depending on the extension of `path`.
///
/// JPEG has no alpha channel, so pixels are composited over black.
pub fn save_image(img: &Image, path: impl AsRef<Path>, gamma: f64) -> Result<(), RenderError> {
    let path = path.as_ref();
    let format = output_format(path)?;
    let rgba = img.to_rgba8(gamma);
    match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(rgba).to_rgb8().save_with_format(path, format)?,
        _ => rgba.save_with_format(path, format)?,
    }
    log::info!("Saved {}x{} image to {}", img.width(), img.height(), path.display());
    Ok(())
}
