//! Drawing surfaces: the host element abstraction and its 2D drawing context.

use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Shape drawn at the ends of stroked lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    /// Canvas keyword for this cap.
    pub fn as_str(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Shape drawn where two stroked segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    /// Canvas keyword for this join.
    pub fn as_str(self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

/// The immediate-mode 2D drawing capability a host surface provides.
///
/// Coordinates are in backing pixels.
pub trait DrawContext {
    /// Drawable image resource produced by the host's image loader.
    type Image;

    fn clear_rect(&mut self, rect: Rect);
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    fn close_path(&mut self);
    fn stroke(&mut self);
    fn stroke_rect(&mut self, rect: Rect);
    fn set_stroke_style(&mut self, style: &str);
    fn set_fill_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    /// Dash pattern for subsequent strokes; empty means solid.
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_font(&mut self, font: &str);
    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> f64;
    fn fill_rect(&mut self, rect: Rect);
    fn fill_text(&mut self, text: &str, position: Point);
    /// Draw `image` scaled to exactly fill `rect`.
    fn draw_image(&mut self, image: &Self::Image, rect: Rect);
}

/// A displayed element backed by a resizable pixel buffer.
pub trait SurfaceElement {
    type Context: DrawContext;

    /// Client-space bounding box of the element, `None` while it is detached.
    fn display_rect(&self) -> Option<Rect>;

    /// Current backing buffer size in pixels.
    fn backing_size(&self) -> (u32, u32);

    /// Resize the backing buffer. Hosts clear the buffer when doing so.
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// Obtain the element's 2D drawing context.
    fn acquire_context(&mut self) -> Option<Self::Context>;
}

/// Image type drawn by surfaces built on `E`.
pub type ImageOf<E> = <<E as SurfaceElement>::Context as DrawContext>::Image;

/// Owns one drawing surface and keeps its backing buffer sized to the element.
///
/// Every operation quietly does nothing until an element is bound and a
/// context has been acquired.
pub struct Surface<E: SurfaceElement> {
    element: Option<E>,
    context: Option<E::Context>,
}

impl<E: SurfaceElement> Default for Surface<E> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<E: SurfaceElement> Surface<E> {
    /// A surface with no element yet.
    pub fn unbound() -> Self {
        Self {
            element: None,
            context: None,
        }
    }

    /// A surface bound to `element`. Call [`Surface::initialize`] before drawing.
    pub fn new(element: E) -> Self {
        Self {
            element: Some(element),
            context: None,
        }
    }

    /// Bind (or rebind) the surface to an element, dropping any old context.
    pub fn bind(&mut self, element: E) {
        self.element = Some(element);
        self.context = None;
    }

    /// Detach the element, returning it.
    pub fn unbind(&mut self) -> Option<E> {
        self.context = None;
        self.element.take()
    }

    /// Acquire the drawing context and size the backing buffer.
    ///
    /// Returns whether the surface is ready to draw.
    pub fn initialize(&mut self) -> bool {
        let Some(element) = self.element.as_mut() else {
            return false;
        };
        if self.context.is_none() {
            self.context = element.acquire_context();
        }
        if self.context.is_none() {
            log::debug!("surface context unavailable");
            return false;
        }
        self.resize();
        true
    }

    /// Match the backing buffer to the element's displayed size.
    ///
    /// Returns `true` when the buffer was resized, which also wiped it; the
    /// caller must redraw.
    pub fn resize(&mut self) -> bool {
        if self.context.is_none() {
            return false;
        }
        let Some(element) = self.element.as_mut() else {
            return false;
        };
        let Some(display) = element.display_rect() else {
            return false;
        };
        let width = display.width().max(0.0).floor() as u32;
        let height = display.height().max(0.0).floor() as u32;
        if element.backing_size() == (width, height) {
            return false;
        }
        element.set_backing_size(width, height);
        log::debug!("surface resized to {}x{}", width, height);
        true
    }

    /// Erase the whole backing buffer.
    pub fn clear(&mut self) {
        let (Some(element), Some(context)) = (self.element.as_ref(), self.context.as_mut()) else {
            return;
        };
        let (width, height) = element.backing_size();
        context.clear_rect(Rect::new(0.0, 0.0, width as f64, height as f64));
    }

    /// Whether both element and context are available.
    pub fn is_ready(&self) -> bool {
        self.element.is_some() && self.context.is_some()
    }

    /// The bound element, if any.
    pub fn element(&self) -> Option<&E> {
        self.element.as_ref()
    }

    /// The drawing context, once acquired.
    pub fn context_mut(&mut self) -> Option<&mut E::Context> {
        self.context.as_mut()
    }

    /// Current screen placement and backing resolution.
    pub fn viewport(&self) -> Option<Viewport> {
        let element = self.element.as_ref()?;
        let display = element.display_rect()?;
        let (width, height) = element.backing_size();
        Some(Viewport::new(display, Size::new(width as f64, height as f64)))
    }

    /// Map a client point into backing pixels.
    pub fn client_to_backing(&self, client: Point) -> Option<Point> {
        self.viewport().map(|viewport| viewport.client_to_backing(client))
    }

    /// Map a client point into element-local coordinates.
    pub fn client_to_local(&self, client: Point) -> Option<Point> {
        self.viewport().map(|viewport| viewport.client_to_local(client))
    }
}
