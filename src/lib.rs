pub mod codec;
pub mod compositor;
pub mod error;
pub mod font;
pub mod placement;
pub mod renderer;
pub mod script;
pub mod session;
pub mod transform;

pub use error::{Result, WatermarkError};

use serde::{Deserialize, Serialize};

pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 300;

pub const ROTATION_STEP: i32 = 5;

// Canvas bounds used before any image has been imported.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1600;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleParameters {
    pub text: String,
    /// Display name from the font catalog; `None` selects the built-in font.
    pub font: Option<String>,
    pub size: u32,
    pub color: Color,
    pub alignment: Alignment,
    /// Counter-clockwise, unbounded. Rendering reduces it mod 360.
    pub rotation: i32,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: &str, alpha: u8) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WatermarkError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| WatermarkError::InvalidColor(hex.to_string()))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: alpha,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl Alignment {
    pub fn offset(self, block_width: f32, line_width: f32) -> f32 {
        let slack = (block_width - line_width).max(0.0);
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => slack / 2.0,
            Alignment::Right => slack,
        }
    }
}

impl Placement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl StyleParameters {
    pub fn clamp_size(size: u32) -> u32 {
        size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    }
}

impl Default for StyleParameters {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: None,
            size: MIN_FONT_SIZE,
            color: Color::WHITE,
            alignment: Alignment::Left,
            rotation: 0,
        }
    }
}
