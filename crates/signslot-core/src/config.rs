//! Styling and timing configuration.
//!
//! All structs deserialize from partial documents; missing fields take their
//! defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default border color for slots and the live selection preview.
pub const DEFAULT_SLOT_STROKE: &str = "#A3D977";

/// How long a single finger must rest before rectangle selection starts.
pub const DEFAULT_LONG_PRESS_MS: u64 = 800;

/// Mouse events arriving this soon after touch input are treated as
/// browser-synthesized compatibility events.
pub const DEFAULT_COMPAT_MOUSE_COOLDOWN_MS: u64 = 1000;

/// Freehand ink appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InkStyle {
    pub color: String,
    pub line_width: f64,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            color: "#000".to_string(),
            line_width: 2.0,
        }
    }
}

/// Badge label drawn above each slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BadgeStyle {
    /// Text before the 1-based slot position.
    pub label: String,
    pub font: String,
    /// Nominal text height used for layout.
    pub text_height: f64,
    pub padding: f64,
    pub background: String,
    pub text_color: String,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        Self {
            label: "field".to_string(),
            font: "12px sans-serif".to_string(),
            text_height: 12.0,
            padding: 4.0,
            background: "rgba(0,0,0,0.6)".to_string(),
            text_color: "white".to_string(),
        }
    }
}

impl BadgeStyle {
    /// Badge text for the slot at list position `index`.
    pub fn text(&self, index: usize) -> String {
        format!("{} {}", self.label, index + 1)
    }
}

/// Slot overlay appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    pub slot_stroke: String,
    pub slot_line_width: f64,
    pub preview_stroke: String,
    pub preview_line_width: f64,
    pub preview_dash: Vec<f64>,
    pub badge: BadgeStyle,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            slot_stroke: DEFAULT_SLOT_STROKE.to_string(),
            slot_line_width: 2.0,
            preview_stroke: DEFAULT_SLOT_STROKE.to_string(),
            preview_line_width: 1.0,
            preview_dash: vec![5.0, 3.0],
            badge: BadgeStyle::default(),
        }
    }
}

/// Gesture timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    pub long_press_ms: u64,
    pub compat_mouse_cooldown_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            compat_mouse_cooldown_ms: DEFAULT_COMPAT_MOUSE_COOLDOWN_MS,
        }
    }
}

impl GestureConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn compat_mouse_cooldown(&self) -> Duration {
        Duration::from_millis(self.compat_mouse_cooldown_ms)
    }
}

/// Everything a signing board needs to know about looks and timing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    pub ink: InkStyle,
    pub overlay: OverlayStyle,
    pub gesture: GestureConfig,
}
