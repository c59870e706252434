//! SignSlot Core Library
//!
//! Platform-agnostic logic for signature-slot overlays: the slot store,
//! surface management, freehand ink, rectangle selection and signature image
//! compositing. Hosts plug in through the [`SurfaceElement`] and
//! [`ImageLoader`] traits.

pub mod compositor;
pub mod config;
pub mod ink;
pub mod input;
pub mod recording;
pub mod selection;
pub mod store;
pub mod surface;
pub mod viewport;

pub use compositor::{CompositeOutcome, Compositor, ImageLoader, LoadCallback, LoadError, RepaintWaker};
pub use config::{BadgeStyle, BoardConfig, GestureConfig, InkStyle, OverlayStyle};
pub use ink::{InkEngine, InkState};
pub use input::{
    CompatMouseFilter, EventResponse, Gesture, GestureStep, Instant, PointerEvent, TouchEvent, TouchPhase,
};
pub use recording::{DrawOp, RecordingContext, RecordingElement};
pub use selection::{SelectionEngine, SelectionState, connect_redraw};
pub use store::{SignatureSlot, SlotEvent, SlotId, SlotRect, SlotStore, Subscription};
pub use surface::{DrawContext, ImageOf, LineCap, LineJoin, Surface, SurfaceElement};
pub use viewport::Viewport;
