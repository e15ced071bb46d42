use anyhow::{anyhow, bail, Result};

/// Palette offered in the toolbar. Order matches the swatch row left to right.
pub const DEFAULT_SWATCHES: [&str; 12] = [
    "#000000", "#ffffff", "#ee3333", "#e64980", "#be4bdb", "#893200", "#228be6", "#3333ee",
    "#40c057", "#00aa00", "#fab005", "#fd7e14",
];

pub const DEFAULT_STROKE_WIDTH: u32 = 3;
pub const MAX_STROKE_WIDTH: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#rrggbb`, `#rrggbbaa` or `rgb(r, g, b)`.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| anyhow!("invalid hex color '{input}'"));
        }
        if let Some(body) = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = body.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                bail!("expected three components in '{input}'");
            }
            let mut rgb = [0u8; 3];
            for (slot, part) in rgb.iter_mut().zip(&parts) {
                *slot = part
                    .parse()
                    .map_err(|_| anyhow!("invalid component '{part}' in '{input}'"))?;
            }
            return Ok(Self::rgba(rgb[0], rgb[1], rgb[2], 255));
        }
        bail!("unsupported color '{input}'")
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStyle {
    pub width: u32,
    pub color: Color,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_STROKE_WIDTH,
            color: Color::WHITE,
        }
    }
}

pub fn default_palette() -> Vec<Color> {
    DEFAULT_SWATCHES
        .iter()
        .filter_map(|s| Color::parse(s).ok())
        .collect()
}
