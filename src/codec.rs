use crate::compositor::flatten_to_rgb;
use crate::error::{Result, WatermarkError};
use crate::transform::fit_to_bounds;
use image::{ImageFormat, RgbaImage};
use std::path::Path;

pub const IMPORT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
    Png,
    Bmp,
    Gif,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = extension_of(path);
        match extension.as_str() {
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "png" => Ok(ExportFormat::Png),
            "bmp" => Ok(ExportFormat::Bmp),
            "gif" => Ok(ExportFormat::Gif),
            _ => Err(WatermarkError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            ExportFormat::Jpeg => ImageFormat::Jpeg,
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Bmp => ImageFormat::Bmp,
            ExportFormat::Gif => ImageFormat::Gif,
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, ExportFormat::Jpeg)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn import_image(path: &Path, max_width: u32, max_height: u32) -> Result<RgbaImage> {
    let extension = extension_of(path);
    if !IMPORT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(WatermarkError::UnsupportedFormat(path.display().to_string()));
    }

    let decoded = image::open(path)?.to_rgba8();
    log::info!(
        "Imported {} ({}x{})",
        path.display(),
        decoded.width(),
        decoded.height()
    );
    Ok(fit_to_bounds(&decoded, max_width, max_height))
}

// JPEG output is flattened onto white first.
pub fn export_image(image: &RgbaImage, path: &Path) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    if format.supports_alpha() {
        image.save_with_format(path, format.image_format())?;
    } else {
        flatten_to_rgb(image).save_with_format(path, format.image_format())?;
    }
    log::info!("Exported {:?} image to {}", format, path.display());
    Ok(())
}
