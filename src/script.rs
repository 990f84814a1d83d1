use crate::error::Result;
use crate::font::FontCatalog;
use crate::session::{SessionConfig, WatermarkSession};
use crate::{Alignment, Color, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, MIN_FONT_SIZE};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionScript {
    pub image: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub fonts_dir: Option<PathBuf>,
    #[serde(default)]
    pub system_fonts: Vec<String>,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default)]
    pub style: StyleScript,
    #[serde(default)]
    pub drags: Vec<DragScript>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleScript {
    pub text: String,
    pub font: Option<String>,
    pub size: u32,
    /// `#RRGGBB`
    pub color: String,
    pub alpha: u8,
    pub alignment: Alignment,
    pub rotation: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DragScript {
    pub from: [i32; 2],
    pub path: Vec<[i32; 2]>,
}

fn default_max_width() -> u32 {
    DEFAULT_CANVAS_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_CANVAS_HEIGHT
}

impl Default for StyleScript {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: None,
            size: MIN_FONT_SIZE,
            color: Color::WHITE.to_hex(),
            alpha: 255,
            alignment: Alignment::Left,
            rotation: 0,
        }
    }
}

impl SessionScript {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // Relative paths inside the script resolve against its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session script {}", path.display()))?;
        let mut script = Self::parse(&json)
            .with_context(|| format!("Failed to parse session script {}", path.display()))?;
        if let Some(dir) = path.parent() {
            script.resolve_paths(dir);
        }
        Ok(script)
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        resolve(&mut self.image);
        resolve(&mut self.output);
        if let Some(fonts_dir) = self.fonts_dir.as_mut() {
            resolve(fonts_dir);
        }
    }

    fn build_catalog(&self) -> FontCatalog {
        let mut catalog = match &self.fonts_dir {
            Some(dir) => FontCatalog::scan(dir).unwrap_or_else(|err| {
                log::warn!("{}; continuing with the built-in font only", err);
                FontCatalog::new()
            }),
            None => FontCatalog::new(),
        };
        for family in &self.system_fonts {
            catalog.register_system_family(family);
        }
        catalog
    }

    pub fn run(&self) -> anyhow::Result<Option<PathBuf>> {
        let config = SessionConfig {
            max_width: self.max_width,
            max_height: self.max_height,
        };
        let mut session = WatermarkSession::new(config, self.build_catalog());

        session
            .import_image(&self.image)
            .with_context(|| format!("Failed to import {}", self.image.display()))?;

        let style = &self.style;
        let color = Color::from_hex(&style.color, style.alpha)?;
        session.set_font(style.font.as_deref());
        session.set_font_size(style.size);
        session.set_color(color);
        session.set_alpha(style.alpha);
        session.set_alignment(style.alignment);
        session.set_rotation(style.rotation);
        session.set_text(&style.text);

        for drag in &self.drags {
            session.begin_drag(drag.from[0], drag.from[1]);
            for [x, y] in &drag.path {
                session.drag_to(*x, *y);
            }
            session.end_drag();
        }

        let placement = session.placement();
        log::info!("Final watermark placement: ({}, {})", placement.x, placement.y);

        let written = session
            .export(&self.output)
            .with_context(|| format!("Failed to export {}", self.output.display()))?;
        Ok(written.then(|| self.output.clone()))
    }
}
