use crate::codec::{export_image, import_image};
use crate::compositor::merge;
use crate::error::Result;
use crate::font::{FontCatalog, WatermarkFont};
use crate::placement::{DragGesture, PlacementTracker};
use crate::renderer::{render_text_layer, TextLayer};
use crate::{
    Alignment, Color, Placement, StyleParameters, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH,
    ROTATION_STEP,
};
use image::RgbaImage;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_CANVAS_WIDTH,
            max_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

pub struct WatermarkSession {
    config: SessionConfig,
    catalog: FontCatalog,
    base: Option<RgbaImage>,
    style: StyleParameters,
    font: WatermarkFont,
    layer: TextLayer,
    tracker: PlacementTracker,
    gesture: DragGesture,
}

impl WatermarkSession {
    pub fn new(config: SessionConfig, catalog: FontCatalog) -> Self {
        let canvas = (config.max_width, config.max_height);
        Self {
            config,
            catalog,
            base: None,
            style: StyleParameters::default(),
            font: WatermarkFont::Builtin,
            layer: TextLayer::empty(),
            tracker: PlacementTracker::centered(canvas, (0, 0)),
            gesture: DragGesture::default(),
        }
    }

    pub fn style(&self) -> &StyleParameters {
        &self.style
    }

    pub fn layer(&self) -> &TextLayer {
        &self.layer
    }

    pub fn placement(&self) -> Placement {
        self.tracker.current()
    }

    pub fn base_image(&self) -> Option<&RgbaImage> {
        self.base.as_ref()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        match &self.base {
            Some(base) => base.dimensions(),
            None => (self.config.max_width, self.config.max_height),
        }
    }

    pub fn import_image(&mut self, path: &Path) -> Result<()> {
        let image = import_image(path, self.config.max_width, self.config.max_height)?;
        self.set_base_image(image);
        Ok(())
    }

    pub fn set_base_image(&mut self, image: RgbaImage) {
        self.base = Some(image);
        self.gesture.end();
        self.rerender();
    }

    pub fn set_text(&mut self, text: &str) {
        self.update_style(|style| style.text = text.to_string());
    }

    pub fn set_font(&mut self, name: Option<&str>) {
        let changed = self.style.font.as_deref() != name;
        if changed {
            self.font = self.catalog.resolve(name);
        }
        self.update_style(|style| style.font = name.map(str::to_string));
    }

    pub fn set_font_size(&mut self, size: u32) {
        let size = StyleParameters::clamp_size(size);
        self.update_style(|style| style.size = size);
    }

    // The current transparency is kept.
    pub fn set_color(&mut self, color: Color) {
        self.update_style(|style| {
            style.color = Color {
                a: style.color.a,
                ..color
            }
        });
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.update_style(|style| style.color.a = alpha);
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.update_style(|style| style.alignment = alignment);
    }

    pub fn rotate_left(&mut self) {
        self.update_style(|style| style.rotation += ROTATION_STEP);
    }

    pub fn rotate_right(&mut self) {
        self.update_style(|style| style.rotation -= ROTATION_STEP);
    }

    pub fn set_rotation(&mut self, degrees: i32) {
        self.update_style(|style| style.rotation = degrees);
    }

    pub fn begin_drag(&mut self, x: i32, y: i32) {
        self.gesture.begin(x, y);
    }

    pub fn drag_to(&mut self, x: i32, y: i32) -> bool {
        let Some(delta) = self.gesture.delta_to(x, y) else {
            return false;
        };
        let canvas = self.canvas_size();
        match self.tracker.drag_by(delta, canvas, self.layer.dimensions()) {
            Some(_) => {
                self.gesture.accept(x, y);
                true
            }
            None => false,
        }
    }

    pub fn end_drag(&mut self) {
        self.gesture.end();
    }

    pub fn merge(&self) -> Option<RgbaImage> {
        merge(self.base.as_ref(), &self.layer, self.tracker.current())
    }

    /// Returns `Ok(false)` without touching the filesystem when there is nothing to export.
    pub fn export(&self, path: &Path) -> Result<bool> {
        let Some(merged) = self.merge() else {
            log::info!("Nothing to export: no image loaded or no watermark text");
            return Ok(false);
        };
        export_image(&merged, path)?;
        Ok(true)
    }

    fn update_style<F: FnOnce(&mut StyleParameters)>(&mut self, apply: F) {
        let previous = self.style.clone();
        apply(&mut self.style);
        if self.style != previous {
            self.rerender();
        }
    }

    fn rerender(&mut self) {
        let canvas = self.canvas_size();
        self.layer = render_text_layer(&self.style, &self.font, canvas);
        let placement = self.tracker.recenter(canvas, self.layer.dimensions());
        log::debug!(
            "Rendered {}x{} watermark at ({}, {}) on {}x{} canvas",
            self.layer.width(),
            self.layer.height(),
            placement.x,
            placement.y,
            canvas.0,
            canvas.1
        );
    }
}
