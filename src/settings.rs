use crate::calc::client::DEFAULT_ENDPOINT;
use crate::draw::model::{
    Color, StrokeStyle, DEFAULT_STROKE_WIDTH, DEFAULT_SWATCHES, MAX_STROKE_WIDTH,
};
use crate::session::overlay::Position;
use crate::session::{SessionOptions, DEFAULT_OVERLAY_DELAY, DEFAULT_OVERLAY_ORIGIN};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// URL of the calculation service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    /// Initial pen color, as `#rrggbb` or `rgb(r, g, b)`.
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default = "default_swatches")]
    pub swatches: Vec<String>,
    /// Delay between a response arriving and its overlays appearing.
    #[serde(default = "default_overlay_delay")]
    pub overlay_delay_ms: u64,
    /// Where overlays appear before any calculation has placed them.
    #[serde(default = "default_overlay_origin")]
    pub overlay_origin: (f32, f32),
    /// Wipe the drawing once its result is shown.
    #[serde(default = "default_true")]
    pub clear_canvas_on_result: bool,
    /// Fixed canvas size. When absent the canvas takes the window area on
    /// the first frame.
    #[serde(default)]
    pub canvas_size: Option<(u32, u32)>,
    #[serde(default = "default_true")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives log output in addition to stderr.
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_window_size")]
    pub window_size: (f32, f32),
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

fn default_color() -> String {
    "rgb(255,255,255)".into()
}

fn default_swatches() -> Vec<String> {
    DEFAULT_SWATCHES.iter().map(|s| (*s).to_string()).collect()
}

fn default_overlay_delay() -> u64 {
    DEFAULT_OVERLAY_DELAY.as_millis() as u64
}

fn default_overlay_origin() -> (f32, f32) {
    (DEFAULT_OVERLAY_ORIGIN.x, DEFAULT_OVERLAY_ORIGIN.y)
}

fn default_true() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

fn default_window_size() -> (f32, f32) {
    (1280.0, 800.0)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
            stroke_width: default_stroke_width(),
            default_color: default_color(),
            swatches: default_swatches(),
            overlay_delay_ms: default_overlay_delay(),
            overlay_origin: default_overlay_origin(),
            clear_canvas_on_result: true,
            canvas_size: None,
            enable_toasts: true,
            toast_duration: default_toast_duration(),
            debug_logging: false,
            log_file: None,
            window_size: default_window_size(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).with_context(|| format!("parse settings file {path}"))
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("write settings file {path}"))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn pen_color(&self) -> Color {
        match Color::parse(&self.default_color) {
            Ok(color) => color,
            Err(e) => {
                tracing::warn!("invalid default_color: {e}; using white");
                Color::WHITE
            }
        }
    }

    /// Parsed palette. Unparseable entries are skipped with a warning.
    pub fn palette(&self) -> Vec<Color> {
        self.swatches
            .iter()
            .filter_map(|s| match Color::parse(s) {
                Ok(color) => Some(color),
                Err(e) => {
                    tracing::warn!("ignoring swatch: {e}");
                    None
                }
            })
            .collect()
    }

    /// `stroke_width` limited to `1..=MAX_STROKE_WIDTH`.
    pub fn stroke_width(&self) -> u32 {
        let width = self.stroke_width.clamp(1, MAX_STROKE_WIDTH);
        if width != self.stroke_width {
            tracing::warn!(
                requested = self.stroke_width,
                used = width,
                "stroke_width out of range; clamping"
            );
        }
        width
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            stroke: StrokeStyle {
                width: self.stroke_width(),
                color: self.pen_color(),
            },
            overlay_delay: Duration::from_millis(self.overlay_delay_ms),
            overlay_origin: Position::from(self.overlay_origin),
            clear_canvas_on_result: self.clear_canvas_on_result,
        }
    }
}
