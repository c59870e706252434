//! SignSlot App
//!
//! Browser shell for SignSlot: mounts the core engines on page canvases,
//! translates DOM input and exposes the slot store to JavaScript as
//! `SignBoard`. Mount options are plain serde types and build natively.

pub mod config;

#[cfg(target_arch = "wasm32")]
mod board;
#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod events;
#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{MountError, MountOptions};

#[cfg(target_arch = "wasm32")]
pub use board::SignBoard;
#[cfg(target_arch = "wasm32")]
pub use canvas::{Canvas2d, CanvasElement, HtmlImageLoader};
