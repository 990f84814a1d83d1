use crate::font::WatermarkFont;
use crate::transform::{alpha_bounds, content_bounds, crop, rotate_expand, Bounds};
use crate::{Color, StyleParameters};
use image::{GrayImage, ImageBuffer, Rgba, RgbaImage};

/// A zero-sized layer means there is nothing to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    image: RgbaImage,
}

pub struct RenderCanvas {
    pub layer: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl TextLayer {
    pub fn empty() -> Self {
        Self {
            image: ImageBuffer::new(0, 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl From<RgbaImage> for TextLayer {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}

impl RenderCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layer: ImageBuffer::new(width, height),
            width,
            height,
        }
    }

    // Coverage scales the color's alpha.
    pub fn stamp(&mut self, mask: &GrayImage, ink: Bounds, x: u32, y: u32, color: Color) {
        for my in 0..ink.height {
            for mx in 0..ink.width {
                let coverage = mask.get_pixel(ink.x + mx, ink.y + my).0[0];
                if coverage == 0 {
                    continue;
                }
                let (px, py) = (x + mx, y + my);
                if px >= self.width || py >= self.height {
                    continue;
                }
                let alpha = (color.a as u32 * coverage as u32 + 127) / 255;
                self.layer
                    .put_pixel(px, py, Rgba([color.r, color.g, color.b, alpha as u8]));
            }
        }
    }
}

pub fn render_text_layer(
    style: &StyleParameters,
    font: &WatermarkFont,
    canvas_size: (u32, u32),
) -> TextLayer {
    if style.text.trim().is_empty() {
        return TextLayer::empty();
    }

    let mask = font.rasterize(&style.text, style.size, style.alignment);
    let Some(ink) = content_bounds(&mask, |p| p.0[0] > 0) else {
        return TextLayer::empty();
    };

    let width = canvas_size.0.max(ink.width);
    let height = canvas_size.1.max(ink.height);
    let mut canvas = RenderCanvas::new(width, height);
    canvas.stamp(
        &mask,
        ink,
        (width - ink.width) / 2,
        (height - ink.height) / 2,
        style.color,
    );

    let rotated = rotate_expand(&canvas.layer, style.rotation as f32);
    match alpha_bounds(&rotated) {
        Some(bounds) => TextLayer::from(crop(&rotated, bounds)),
        None => TextLayer::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Alignment;

    fn style(text: &str) -> StyleParameters {
        StyleParameters {
            text: text.to_string(),
            size: 16,
            color: Color::rgba(255, 0, 0, 200),
            ..StyleParameters::default()
        }
    }

    #[test]
    fn empty_and_blank_text_yield_empty_layers() {
        for text in ["", "   ", "\n\t "] {
            let layer = render_text_layer(&style(text), &WatermarkFont::Builtin, (64, 64));
            assert!(layer.is_empty(), "{:?} produced a layer", text);
            assert_eq!(layer.dimensions(), (0, 0));
        }
    }

    #[test]
    fn layer_is_cropped_to_glyph_pixels() {
        let layer = render_text_layer(&style("HI"), &WatermarkFont::Builtin, (120, 80));
        // 'H' starts at column 1 of its cell and 'I' ends at column 6, both at scale 2.
        assert_eq!(layer.dimensions(), (30, 14));
        assert_eq!(layer.image().get_pixel(0, 0).0, [255, 0, 0, 200]);
        assert_eq!(layer.image().get_pixel(2, 0).0[3], 0);
    }

    #[test]
    fn rendering_is_repeatable() {
        let mut s = style("Sample\nwatermark");
        s.rotation = 35;
        s.alignment = Alignment::Center;
        let first = render_text_layer(&s, &WatermarkFont::Builtin, (200, 120));
        let second = render_text_layer(&s, &WatermarkFont::Builtin, (200, 120));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn text_larger_than_canvas_is_not_clipped() {
        let s = style("WATERMARK");
        let small = render_text_layer(&s, &WatermarkFont::Builtin, (10, 10));
        let large = render_text_layer(&s, &WatermarkFont::Builtin, (400, 100));
        assert_eq!(small, large);
    }

    #[test]
    fn rotation_round_trip_restores_dimensions() {
        let mut s = style("Rotate me");
        let original = render_text_layer(&s, &WatermarkFont::Builtin, (240, 120));

        s.rotation = 5;
        let tilted = render_text_layer(&s, &WatermarkFont::Builtin, (240, 120));
        assert_ne!(tilted.dimensions(), original.dimensions());
        assert!(tilted.height() > original.height());

        s.rotation = 0;
        let restored = render_text_layer(&s, &WatermarkFont::Builtin, (240, 120));
        assert_eq!(restored.dimensions(), original.dimensions());
    }

    #[test]
    fn quarter_turn_swaps_layer_axes() {
        let mut s = style("ABC");
        let flat = render_text_layer(&s, &WatermarkFont::Builtin, (100, 100));
        s.rotation = 90;
        let upright = render_text_layer(&s, &WatermarkFont::Builtin, (100, 100));
        assert_eq!(upright.dimensions(), (flat.height(), flat.width()));
        s.rotation = -270;
        assert_eq!(render_text_layer(&s, &WatermarkFont::Builtin, (100, 100)), upright);
    }

    #[test]
    fn fully_transparent_color_renders_nothing() {
        let mut s = style("ghost");
        s.color.a = 0;
        assert!(render_text_layer(&s, &WatermarkFont::Builtin, (100, 100)).is_empty());
    }
}
