use crate::renderer::TextLayer;
use crate::Placement;
use image::{imageops, ImageBuffer, Rgb, RgbImage, RgbaImage};

/// Returns `None` when there is no base image or no watermark to draw.
pub fn merge(base: Option<&RgbaImage>, layer: &TextLayer, placement: Placement) -> Option<RgbaImage> {
    let base = base?;
    if layer.is_empty() {
        return None;
    }

    let mut merged = base.clone();
    imageops::overlay(
        &mut merged,
        layer.image(),
        placement.x as i64,
        placement.y as i64,
    );
    Some(merged)
}

pub fn flatten_to_rgb(image: &RgbaImage) -> RgbImage {
    let mut flat = ImageBuffer::from_pixel(image.width(), image.height(), Rgb([255, 255, 255]));

    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = pixel.0[3] as f32 / 255.0;
        let inv_alpha = 1.0 - alpha;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        flat.put_pixel(x, y, Rgb([blend(pixel.0[0]), blend(pixel.0[1]), blend(pixel.0[2])]));
    }

    flat
}
