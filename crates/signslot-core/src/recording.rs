//! Recording surface backend for headless use and testing.
//!
//! Every drawing call is appended to a shared log of [`DrawOp`]s instead of
//! touching pixels, so engine output can be inspected and compared.

use crate::surface::{DrawContext, LineCap, LineJoin, SurfaceElement};
use kurbo::{Point, Rect};
use std::cell::RefCell;
use std::rc::Rc;

/// Approximate advance of one character of a 12px sans-serif font.
pub const DEFAULT_CHAR_WIDTH: f64 = 6.5;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp<I> {
    /// The backing buffer was resized (and thereby wiped).
    Resize { width: u32, height: u32 },
    ClearRect(Rect),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
    Stroke,
    StrokeRect(Rect),
    StrokeStyle(String),
    FillStyle(String),
    LineWidth(f64),
    LineCap(LineCap),
    LineJoin(LineJoin),
    LineDash(Vec<f64>),
    Font(String),
    FillRect(Rect),
    FillText { text: String, position: Point },
    DrawImage { image: I, rect: Rect },
}

type OpLog<I> = Rc<RefCell<Vec<DrawOp<I>>>>;

/// Draw context that appends to an op log.
pub struct RecordingContext<I> {
    ops: OpLog<I>,
    char_width: f64,
}

impl<I> RecordingContext<I> {
    fn push(&self, op: DrawOp<I>) {
        self.ops.borrow_mut().push(op);
    }
}

impl<I: Clone> DrawContext for RecordingContext<I> {
    type Image = I;

    fn clear_rect(&mut self, rect: Rect) {
        self.push(DrawOp::ClearRect(rect));
    }

    fn begin_path(&mut self) {
        self.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, point: Point) {
        self.push(DrawOp::MoveTo(point));
    }

    fn line_to(&mut self, point: Point) {
        self.push(DrawOp::LineTo(point));
    }

    fn close_path(&mut self) {
        self.push(DrawOp::ClosePath);
    }

    fn stroke(&mut self) {
        self.push(DrawOp::Stroke);
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.push(DrawOp::StrokeRect(rect));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawOp::StrokeStyle(style.to_string()));
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawOp::FillStyle(style.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawOp::LineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.push(DrawOp::LineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.push(DrawOp::LineJoin(join));
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.push(DrawOp::LineDash(segments.to_vec()));
    }

    fn set_font(&mut self, font: &str) {
        self.push(DrawOp::Font(font.to_string()));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.push(DrawOp::FillRect(rect));
    }

    fn fill_text(&mut self, text: &str, position: Point) {
        self.push(DrawOp::FillText {
            text: text.to_string(),
            position,
        });
    }

    fn draw_image(&mut self, image: &I, rect: Rect) {
        self.push(DrawOp::DrawImage {
            image: image.clone(),
            rect,
        });
    }
}

struct ElementState {
    display: Option<Rect>,
    backing: (u32, u32),
    has_context: bool,
}

/// An in-memory surface element. Clones share the same state and op log.
pub struct RecordingElement<I> {
    state: Rc<RefCell<ElementState>>,
    ops: OpLog<I>,
    char_width: f64,
}

impl<I> Clone for RecordingElement<I> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            ops: Rc::clone(&self.ops),
            char_width: self.char_width,
        }
    }
}

impl<I> RecordingElement<I> {
    /// An element displayed at `display` (client coordinates).
    pub fn new(display: Rect) -> Self {
        Self::with_state(Some(display), true)
    }

    /// An element whose drawing context can never be acquired.
    pub fn without_context(display: Rect) -> Self {
        Self::with_state(Some(display), false)
    }

    /// An element that is not attached to any layout.
    pub fn detached() -> Self {
        Self::with_state(None, true)
    }

    fn with_state(display: Option<Rect>, has_context: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(ElementState {
                display,
                backing: (0, 0),
                has_context,
            })),
            ops: Rc::new(RefCell::new(Vec::new())),
            char_width: DEFAULT_CHAR_WIDTH,
        }
    }

    /// Move or resize the displayed element.
    pub fn set_display_rect(&self, display: Option<Rect>) {
        self.state.borrow_mut().display = display;
    }

    /// Forget every recorded op.
    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// Number of ops recorded so far.
    pub fn op_count(&self) -> usize {
        self.ops.borrow().len()
    }
}

impl<I: Clone> RecordingElement<I> {
    /// Copy of the op log.
    pub fn ops(&self) -> Vec<DrawOp<I>> {
        self.ops.borrow().clone()
    }

    /// Drain the op log.
    pub fn take_ops(&self) -> Vec<DrawOp<I>> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }
}

impl<I: Clone> SurfaceElement for RecordingElement<I> {
    type Context = RecordingContext<I>;

    fn display_rect(&self) -> Option<Rect> {
        self.state.borrow().display
    }

    fn backing_size(&self) -> (u32, u32) {
        self.state.borrow().backing
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().backing = (width, height);
        self.ops.borrow_mut().push(DrawOp::Resize { width, height });
    }

    fn acquire_context(&mut self) -> Option<Self::Context> {
        if !self.state.borrow().has_context {
            return None;
        }
        Some(RecordingContext {
            ops: Rc::clone(&self.ops),
            char_width: self.char_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_shares_log_with_element() {
        let mut element = RecordingElement::<()>::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut ctx = element.acquire_context().unwrap();
        ctx.begin_path();
        ctx.move_to(Point::new(1.0, 2.0));
        assert_eq!(
            element.ops(),
            vec![DrawOp::BeginPath, DrawOp::MoveTo(Point::new(1.0, 2.0))]
        );
    }

    #[test]
    fn test_measure_text_scales_with_length() {
        let mut element = RecordingElement::<()>::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut ctx = element.acquire_context().unwrap();
        assert!((ctx.measure_text("field 1") - 7.0 * DEFAULT_CHAR_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_take_ops_drains() {
        let mut element = RecordingElement::<()>::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        element.set_backing_size(4, 4);
        assert_eq!(element.take_ops().len(), 1);
        assert_eq!(element.op_count(), 0);
    }
}
