//! Mount options for the browser board.

use serde::{Deserialize, Serialize};
use signslot_core::BoardConfig;
use thiserror::Error;

/// Errors raised while mounting a board onto the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("No browser window or document available")]
    NoDocument,
    #[error("Element #{0} not found")]
    MissingElement(String),
    #[error("Element #{0} is not a canvas")]
    NotACanvas(String),
    #[error("Canvas id for the {0} layer is empty")]
    EmptyId(&'static str),
    #[error("Canvas #{0} is used for more than one layer")]
    SharedCanvas(String),
    #[error("Invalid mount options: {0}")]
    InvalidOptions(String),
}

/// Which canvases to mount on and how the board looks and behaves.
///
/// Style and gesture settings sit at the top level next to the canvas ids:
/// `{ "overlayCanvas": "rects", "ink": { "color": "#00f" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MountOptions {
    /// Freehand ink layer; `null` mounts without one.
    pub ink_canvas: Option<String>,
    /// Slot borders, badges and the selection preview. Receives selection input.
    pub overlay_canvas: String,
    /// Signature images.
    pub signature_canvas: String,
    #[serde(flatten)]
    pub board: BoardConfig,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            ink_canvas: Some("ink-canvas".to_string()),
            overlay_canvas: "rect-canvas".to_string(),
            signature_canvas: "signature-canvas".to_string(),
            board: BoardConfig::default(),
        }
    }
}

impl MountOptions {
    /// Check that every layer names its own canvas.
    pub fn validate(&self) -> Result<(), MountError> {
        let mut ids: Vec<(&'static str, &str)> = vec![
            ("overlay", self.overlay_canvas.as_str()),
            ("signature", self.signature_canvas.as_str()),
        ];
        if let Some(ink) = self.ink_canvas.as_deref() {
            ids.push(("ink", ink));
        }

        for (index, (layer, id)) in ids.iter().enumerate() {
            if id.trim().is_empty() {
                return Err(MountError::EmptyId(*layer));
            }
            if ids[..index].iter().any(|(_, other)| other == id) {
                return Err(MountError::SharedCanvas(id.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_canvas_ids() {
        let options = MountOptions::default();
        assert_eq!(options.ink_canvas.as_deref(), Some("ink-canvas"));
        assert_eq!(options.overlay_canvas, "rect-canvas");
        assert_eq!(options.signature_canvas, "signature-canvas");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_options_with_flattened_styles() {
        let options: MountOptions = serde_json::from_str(
            r##"{ "overlayCanvas": "rects", "ink": { "color": "#00f" }, "gesture": { "longPressMs": 600 } }"##,
        )
        .unwrap();
        assert_eq!(options.overlay_canvas, "rects");
        assert_eq!(options.signature_canvas, "signature-canvas");
        assert_eq!(options.board.ink.color, "#00f");
        assert_eq!(options.board.gesture.long_press_ms, 600);
    }

    #[test]
    fn test_null_ink_canvas_disables_ink() {
        let options: MountOptions = serde_json::from_str(r#"{ "inkCanvas": null }"#).unwrap();
        assert_eq!(options.ink_canvas, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ids() {
        let options = MountOptions {
            signature_canvas: " ".to_string(),
            ..MountOptions::default()
        };
        assert_eq!(options.validate(), Err(MountError::EmptyId("signature")));

        let options = MountOptions {
            ink_canvas: Some("rect-canvas".to_string()),
            ..MountOptions::default()
        };
        assert_eq!(
            options.validate(),
            Err(MountError::SharedCanvas("rect-canvas".to_string()))
        );
    }
}
