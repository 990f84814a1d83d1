use crate::error::{Result, WatermarkError};
use crate::Alignment;
use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use image::{GrayImage, Luma};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const LINE_SPACING: u32 = 4;

#[derive(Clone)]
pub enum WatermarkFont {
    Outline(FontArc),
    // 8x8 bitmap font compiled into the binary.
    Builtin,
}

#[derive(Debug, Clone)]
enum FontSource {
    File(PathBuf),
    Memory(Arc<Vec<u8>>),
}

#[derive(Debug, Clone)]
pub struct FontEntry {
    pub name: String,
    source: FontSource,
}

#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    entries: Vec<FontEntry>,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatermarkFont::Outline(_) => f.write_str("WatermarkFont::Outline"),
            WatermarkFont::Builtin => f.write_str("WatermarkFont::Builtin"),
        }
    }
}

impl WatermarkFont {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(data).ok_or_else(|| WatermarkError::InvalidFont(path.to_path_buf()))
    }

    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        FontArc::try_from_vec(data).ok().map(WatermarkFont::Outline)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, WatermarkFont::Builtin)
    }

    // The mask may carry blank margins; callers trim it with the ink bounds.
    pub fn rasterize(&self, text: &str, size: u32, alignment: Alignment) -> GrayImage {
        let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
        match self {
            WatermarkFont::Outline(font) => rasterize_outline(font, &lines, size, alignment),
            WatermarkFont::Builtin => rasterize_builtin(&lines, size, alignment),
        }
    }
}

fn em_scale(font: &FontArc, size: u32) -> PxScale {
    // PxScale is the ascent-to-descent height; convert from an em size in pixels.
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size as f32 * font.height_unscaled() / units_per_em)
}

fn line_advance<F: Font, SF: ScaleFont<F>>(scaled: &SF, line: &str) -> f32 {
    let mut width = 0.0;
    let mut previous: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn rasterize_outline(font: &FontArc, lines: &[&str], size: u32, alignment: Alignment) -> GrayImage {
    let scale = em_scale(font, size);
    let scaled = font.as_scaled(scale);
    let line_height = scaled.height() + scaled.line_gap() + LINE_SPACING as f32;

    let widths: Vec<f32> = lines.iter().map(|line| line_advance(&scaled, line)).collect();
    let block_width = widths.iter().copied().fold(0.0, f32::max);

    let mut outlined = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let mut caret = point(
            alignment.offset(block_width, widths[index]),
            index as f32 * line_height + scaled.ascent(),
        );
        let mut previous: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, caret);
            caret.x += scaled.h_advance(id);
            previous = Some(id);
            if let Some(glyph) = font.outline_glyph(glyph) {
                outlined.push(glyph);
            }
        }
    }

    if outlined.is_empty() {
        return GrayImage::new(0, 0);
    }

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    let width = (max_x - min_x).ceil().max(0.0) as u32;
    let height = (max_y - min_y).ceil().max(0.0) as u32;
    let mut mask = GrayImage::new(width, height);

    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        let left = (bounds.min.x - min_x).round() as u32;
        let top = (bounds.min.y - min_y).round() as u32;
        glyph.draw(|gx, gy, coverage| {
            let (x, y) = (left + gx, top + gy);
            if x < width && y < height {
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = mask.get_pixel_mut(x, y);
                // Overlapping glyphs keep the stronger coverage.
                pixel.0[0] = pixel.0[0].max(value);
            }
        });
    }

    mask
}

fn rasterize_builtin(lines: &[&str], size: u32, alignment: Alignment) -> GrayImage {
    let scale = (size / 8).max(1);
    let advance = 8 * scale + scale;
    let line_height = 8 * scale + LINE_SPACING;

    let line_width = |line: &str| {
        let count = line.chars().count() as u32;
        (count * advance).saturating_sub(scale)
    };
    let widths: Vec<u32> = lines.iter().map(|&line| line_width(line)).collect();
    let block_width = widths.iter().copied().max().unwrap_or(0);
    let block_height = (lines.len() as u32 * line_height).saturating_sub(LINE_SPACING);

    let mut mask = GrayImage::new(block_width, block_height);
    for (index, line) in lines.iter().enumerate() {
        let offset = alignment.offset(block_width as f32, widths[index] as f32) as u32;
        let top = index as u32 * line_height;
        for (column, ch) in line.chars().enumerate() {
            let Some(bitmap) = builtin_glyph(ch) else {
                continue;
            };
            let left = offset + column as u32 * advance;
            draw_bitmap(&mut mask, left, top, bitmap, scale);
        }
    }
    mask
}

fn draw_bitmap(mask: &mut GrayImage, x: u32, y: u32, bitmap: &[u8; 8], scale: u32) {
    for (row, byte) in bitmap.iter().enumerate() {
        for col in 0..8u32 {
            if (*byte >> (7 - col)) & 1 == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let px = x + col * scale + sx;
                    let py = y + row as u32 * scale + sy;
                    if px < mask.width() && py < mask.height() {
                        mask.put_pixel(px, py, Luma([255]));
                    }
                }
            }
        }
    }
}

// `None` is a blank cell that still advances the caret.
fn builtin_glyph(ch: char) -> Option<&'static [u8; 8]> {
    if ch.is_whitespace() {
        return None;
    }
    let lookup = |c: char| {
        BUILTIN_GLYPHS
            .iter()
            .find(|(glyph, _)| *glyph == c)
            .map(|(_, bitmap)| bitmap)
    };
    lookup(ch)
        .or_else(|| ch.to_uppercase().next().and_then(lookup))
        .or_else(|| lookup('?'))
}

#[rustfmt::skip]
static BUILTIN_GLYPHS: &[(char, [u8; 8])] = &[
    ('A', [0x18, 0x24, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x00]),
    ('B', [0x7C, 0x42, 0x42, 0x7C, 0x42, 0x42, 0x7C, 0x00]),
    ('C', [0x3C, 0x42, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00]),
    ('D', [0x78, 0x44, 0x42, 0x42, 0x42, 0x44, 0x78, 0x00]),
    ('E', [0x7E, 0x40, 0x40, 0x7C, 0x40, 0x40, 0x7E, 0x00]),
    ('F', [0x7E, 0x40, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x00]),
    ('G', [0x3C, 0x42, 0x40, 0x4E, 0x42, 0x42, 0x3C, 0x00]),
    ('H', [0x42, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x00]),
    ('I', [0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00]),
    ('J', [0x02, 0x02, 0x02, 0x02, 0x02, 0x42, 0x3C, 0x00]),
    ('K', [0x44, 0x48, 0x50, 0x60, 0x50, 0x48, 0x44, 0x00]),
    ('L', [0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x7E, 0x00]),
    ('M', [0x42, 0x66, 0x5A, 0x42, 0x42, 0x42, 0x42, 0x00]),
    ('N', [0x42, 0x62, 0x52, 0x4A, 0x46, 0x42, 0x42, 0x00]),
    ('O', [0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00]),
    ('P', [0x7C, 0x42, 0x42, 0x7C, 0x40, 0x40, 0x40, 0x00]),
    ('Q', [0x3C, 0x42, 0x42, 0x42, 0x4A, 0x44, 0x3A, 0x00]),
    ('R', [0x7C, 0x42, 0x42, 0x7C, 0x48, 0x44, 0x42, 0x00]),
    ('S', [0x3C, 0x42, 0x40, 0x3C, 0x02, 0x42, 0x3C, 0x00]),
    ('T', [0x7F, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00]),
    ('U', [0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00]),
    ('V', [0x42, 0x42, 0x42, 0x42, 0x24, 0x18, 0x18, 0x00]),
    ('W', [0x42, 0x42, 0x42, 0x42, 0x5A, 0x66, 0x42, 0x00]),
    ('X', [0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x42, 0x00]),
    ('Y', [0x41, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x00]),
    ('Z', [0x7E, 0x04, 0x08, 0x10, 0x20, 0x40, 0x7E, 0x00]),
    ('a', [0x00, 0x00, 0x3C, 0x02, 0x3E, 0x42, 0x3E, 0x00]),
    ('b', [0x40, 0x40, 0x5C, 0x62, 0x42, 0x62, 0x5C, 0x00]),
    ('c', [0x00, 0x00, 0x3C, 0x40, 0x40, 0x40, 0x3C, 0x00]),
    ('d', [0x02, 0x02, 0x3A, 0x46, 0x42, 0x46, 0x3A, 0x00]),
    ('e', [0x00, 0x00, 0x3C, 0x42, 0x7E, 0x40, 0x3C, 0x00]),
    ('f', [0x0C, 0x12, 0x10, 0x7C, 0x10, 0x10, 0x10, 0x00]),
    ('g', [0x00, 0x3A, 0x46, 0x42, 0x3E, 0x02, 0x3C, 0x00]),
    ('h', [0x40, 0x40, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x00]),
    ('i', [0x08, 0x00, 0x18, 0x08, 0x08, 0x08, 0x1C, 0x00]),
    ('j', [0x04, 0x00, 0x0C, 0x04, 0x04, 0x44, 0x38, 0x00]),
    ('k', [0x40, 0x40, 0x44, 0x48, 0x70, 0x48, 0x44, 0x00]),
    ('l', [0x30, 0x10, 0x10, 0x10, 0x10, 0x10, 0x38, 0x00]),
    ('m', [0x00, 0x00, 0x76, 0x49, 0x49, 0x49, 0x49, 0x00]),
    ('n', [0x00, 0x00, 0x5C, 0x62, 0x42, 0x42, 0x42, 0x00]),
    ('o', [0x00, 0x00, 0x3C, 0x42, 0x42, 0x42, 0x3C, 0x00]),
    ('p', [0x00, 0x5C, 0x62, 0x42, 0x7C, 0x40, 0x40, 0x00]),
    ('q', [0x00, 0x3A, 0x46, 0x42, 0x3E, 0x02, 0x02, 0x00]),
    ('r', [0x00, 0x00, 0x5C, 0x62, 0x40, 0x40, 0x40, 0x00]),
    ('s', [0x00, 0x00, 0x3E, 0x40, 0x3C, 0x02, 0x7C, 0x00]),
    ('t', [0x10, 0x10, 0x7C, 0x10, 0x10, 0x12, 0x0C, 0x00]),
    ('u', [0x00, 0x00, 0x42, 0x42, 0x42, 0x46, 0x3A, 0x00]),
    ('v', [0x00, 0x00, 0x42, 0x42, 0x42, 0x24, 0x18, 0x00]),
    ('w', [0x00, 0x00, 0x41, 0x49, 0x49, 0x49, 0x36, 0x00]),
    ('x', [0x00, 0x00, 0x42, 0x24, 0x18, 0x24, 0x42, 0x00]),
    ('y', [0x00, 0x42, 0x42, 0x46, 0x3A, 0x02, 0x3C, 0x00]),
    ('z', [0x00, 0x00, 0x7E, 0x04, 0x18, 0x20, 0x7E, 0x00]),
    ('0', [0x3C, 0x46, 0x4A, 0x52, 0x62, 0x62, 0x3C, 0x00]),
    ('1', [0x18, 0x28, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00]),
    ('2', [0x3C, 0x42, 0x02, 0x0C, 0x30, 0x40, 0x7E, 0x00]),
    ('3', [0x3C, 0x42, 0x02, 0x1C, 0x02, 0x42, 0x3C, 0x00]),
    ('4', [0x08, 0x18, 0x28, 0x48, 0x7E, 0x08, 0x08, 0x00]),
    ('5', [0x7E, 0x40, 0x7C, 0x02, 0x02, 0x42, 0x3C, 0x00]),
    ('6', [0x3C, 0x40, 0x40, 0x7C, 0x42, 0x42, 0x3C, 0x00]),
    ('7', [0x7E, 0x02, 0x04, 0x08, 0x10, 0x20, 0x20, 0x00]),
    ('8', [0x3C, 0x42, 0x42, 0x3C, 0x42, 0x42, 0x3C, 0x00]),
    ('9', [0x3C, 0x42, 0x42, 0x3E, 0x02, 0x02, 0x3C, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x30]),
    ('!', [0x18, 0x18, 0x18, 0x18, 0x00, 0x00, 0x18, 0x00]),
    ('?', [0x3C, 0x42, 0x04, 0x08, 0x08, 0x00, 0x08, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7E]),
    ('+', [0x00, 0x08, 0x08, 0x3E, 0x08, 0x08, 0x00, 0x00]),
    (':', [0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00]),
    ('\'', [0x18, 0x18, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('/', [0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x00, 0x00]),
    ('(', [0x0C, 0x10, 0x20, 0x20, 0x20, 0x10, 0x0C, 0x00]),
    (')', [0x30, 0x08, 0x04, 0x04, 0x04, 0x08, 0x30, 0x00]),
    ('#', [0x24, 0x24, 0x7E, 0x24, 0x7E, 0x24, 0x24, 0x00]),
    ('&', [0x30, 0x48, 0x30, 0x52, 0x4C, 0x44, 0x3A, 0x00]),
    ('@', [0x3C, 0x42, 0x5A, 0x56, 0x5C, 0x40, 0x3C, 0x00]),
    ('©', [0x3C, 0x42, 0x99, 0xA1, 0xA1, 0x99, 0x42, 0x3C]),
];

pub fn display_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let mut name = String::with_capacity(stem.len());
    let mut previous_cased = false;
    for ch in stem.chars() {
        if ch.is_alphabetic() {
            if previous_cased {
                name.extend(ch.to_lowercase());
            } else {
                name.extend(ch.to_uppercase());
            }
            previous_cased = true;
        } else {
            name.push(ch);
            previous_cased = false;
        }
    }
    name
}

impl FontCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(dir: &Path) -> Result<Self> {
        let read_dir = fs::read_dir(dir).map_err(|source| WatermarkError::FontDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_ttf = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"));
            if !is_ttf {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            entries.push(FontEntry {
                name: display_name(file_name),
                source: FontSource::File(path.clone()),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        log::info!("Found {} font(s) in {}", entries.len(), dir.display());
        Ok(Self { entries })
    }

    pub fn register_system_family(&mut self, family: &str) -> bool {
        let source = SystemSource::new();
        let handle = match source
            .select_best_match(&[FamilyName::Title(family.to_string())], &Properties::new())
        {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("System font family {:?} not found: {:?}", family, err);
                return false;
            }
        };

        let source = match handle {
            Handle::Path { path, .. } => FontSource::File(path),
            Handle::Memory { bytes, .. } => FontSource::Memory(bytes),
        };
        self.entries.retain(|entry| entry.name != family);
        self.entries.push(FontEntry {
            name: family.to_string(),
            source,
        });
        self.entries.sort_by(|a, b| a.name.cmp(&b.name));
        true
    }

    pub fn insert_file(&mut self, name: &str, path: PathBuf) {
        self.entries.retain(|entry| entry.name != name);
        self.entries.push(FontEntry {
            name: name.to_string(),
            source: FontSource::File(path),
        });
        self.entries.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn resolve(&self, name: Option<&str>) -> WatermarkFont {
        let Some(name) = name else {
            return WatermarkFont::Builtin;
        };
        let Some(entry) = self.entries.iter().find(|entry| entry.name == name) else {
            log::warn!("Font {:?} is not in the catalog, using built-in font", name);
            return WatermarkFont::Builtin;
        };

        let loaded = match &entry.source {
            FontSource::File(path) => WatermarkFont::from_file(path).map_err(|err| err.to_string()),
            FontSource::Memory(bytes) => WatermarkFont::from_bytes(bytes.to_vec())
                .ok_or_else(|| "font data is not TrueType".to_string()),
        };
        match loaded {
            Ok(font) => font,
            Err(err) => {
                log::warn!("Cannot load font {:?} ({}), using built-in font", name, err);
                WatermarkFont::Builtin
            }
        }
    }
}
