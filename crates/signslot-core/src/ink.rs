//! Freehand ink engine.
//!
//! Turns a stream of pointer positions into a continuous stroke on a surface.
//! Each new segment is painted as soon as it arrives, so a stroke is visible
//! while it is still being drawn.

use crate::config::InkStyle;
use crate::input::{EventResponse, Gesture, PointerEvent, TouchEvent, TouchPhase, mouse_step, touch_step};
use crate::surface::{DrawContext, LineCap, LineJoin, Surface, SurfaceElement};
use kurbo::Point;

/// Stroke state of an ink surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InkState {
    Idle,
    Stroking {
        /// Last point of the path, in surface-local coordinates.
        last: Point,
        /// Segments painted so far.
        segments: usize,
    },
}

/// Freehand drawing on a single surface.
pub struct InkEngine<E: SurfaceElement> {
    surface: Surface<E>,
    style: InkStyle,
    state: InkState,
}

impl<E: SurfaceElement> InkEngine<E> {
    /// Create an engine drawing on `surface` with the default ink.
    pub fn new(surface: Surface<E>) -> Self {
        Self {
            surface,
            style: InkStyle::default(),
            state: InkState::Idle,
        }
    }

    /// Set the ink style for subsequent segments.
    pub fn with_style(mut self, style: InkStyle) -> Self {
        self.style = style;
        self
    }

    /// Current ink style.
    pub fn style(&self) -> &InkStyle {
        &self.style
    }

    /// Current stroke state.
    pub fn state(&self) -> InkState {
        self.state
    }

    /// Whether a stroke is in progress.
    pub fn is_stroking(&self) -> bool {
        matches!(self.state, InkState::Stroking { .. })
    }

    /// The surface being drawn on.
    pub fn surface(&self) -> &Surface<E> {
        &self.surface
    }

    /// Acquire the context and size the surface.
    pub fn initialize(&mut self) -> bool {
        self.surface.initialize()
    }

    /// Follow the element's displayed size. Resizing wipes existing ink.
    pub fn resize(&mut self) -> bool {
        self.surface.resize()
    }

    /// Erase all ink.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Feed a mouse event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> EventResponse {
        self.apply(mouse_step(event));
        EventResponse::PASS
    }

    /// Feed a touch event. Start and move are consumed so the page does not
    /// scroll underneath the pen.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> EventResponse {
        match event.phase {
            TouchPhase::Start => {
                if !self.surface.is_ready() {
                    return EventResponse::PASS;
                }
                if let Some(step) = touch_step(event) {
                    self.apply(step);
                }
                EventResponse::CONSUME
            }
            TouchPhase::Move => {
                if !self.is_stroking() {
                    return EventResponse::PASS;
                }
                if let Some(step) = touch_step(event) {
                    self.apply(step);
                }
                EventResponse::CONSUME
            }
            TouchPhase::End | TouchPhase::Cancel => {
                self.end(None);
                EventResponse::PASS
            }
        }
    }

    /// Drop any stroke in progress and erase the layer.
    pub fn teardown(&mut self) {
        self.end(None);
        self.surface.clear();
    }
}

impl<E: SurfaceElement> Gesture for InkEngine<E> {
    fn begin(&mut self, point: Point) {
        if self.is_stroking() {
            self.end(None);
        }
        let Some(local) = self.surface.client_to_local(point) else {
            return;
        };
        let Some(ctx) = self.surface.context_mut() else {
            return;
        };
        ctx.begin_path();
        ctx.move_to(local);
        self.state = InkState::Stroking {
            last: local,
            segments: 0,
        };
        log::debug!("ink stroke started at ({:.1}, {:.1})", local.x, local.y);
    }

    fn continue_to(&mut self, point: Point) {
        let InkState::Stroking { segments, .. } = self.state else {
            return;
        };
        let Some(local) = self.surface.client_to_local(point) else {
            return;
        };
        let Some(ctx) = self.surface.context_mut() else {
            return;
        };
        ctx.line_to(local);
        ctx.set_stroke_style(&self.style.color);
        ctx.set_line_width(self.style.line_width);
        ctx.set_line_cap(LineCap::Round);
        ctx.set_line_join(LineJoin::Round);
        ctx.stroke();
        self.state = InkState::Stroking {
            last: local,
            segments: segments + 1,
        };
    }

    fn end(&mut self, _point: Option<Point>) {
        let InkState::Stroking { segments, .. } = self.state else {
            return;
        };
        if let Some(ctx) = self.surface.context_mut() {
            ctx.close_path();
        }
        self.state = InkState::Idle;
        log::debug!("ink stroke finished after {} segments", segments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawOp, RecordingElement};
    use kurbo::Rect;

    fn engine() -> (InkEngine<RecordingElement<()>>, RecordingElement<()>) {
        let element = RecordingElement::new(Rect::new(10.0, 20.0, 210.0, 120.0));
        let mut engine = InkEngine::new(Surface::new(element.clone()));
        assert!(engine.initialize());
        element.clear_ops();
        (engine, element)
    }

    fn segment_ops(to: Point) -> Vec<DrawOp<()>> {
        vec![
            DrawOp::LineTo(to),
            DrawOp::StrokeStyle("#000".to_string()),
            DrawOp::LineWidth(2.0),
            DrawOp::LineCap(LineCap::Round),
            DrawOp::LineJoin(LineJoin::Round),
            DrawOp::Stroke,
        ]
    }

    #[test]
    fn test_mouse_stroke_paints_each_segment() {
        let (mut engine, element) = engine();

        engine.handle_pointer(&PointerEvent::Down { position: Point::new(15.0, 25.0) });
        assert!(engine.is_stroking());
        assert_eq!(
            element.take_ops(),
            vec![DrawOp::BeginPath, DrawOp::MoveTo(Point::new(5.0, 5.0))]
        );

        engine.handle_pointer(&PointerEvent::Move { position: Point::new(30.0, 40.0) });
        assert_eq!(element.take_ops(), segment_ops(Point::new(20.0, 20.0)));

        engine.handle_pointer(&PointerEvent::Up { position: Point::new(30.0, 40.0) });
        assert!(!engine.is_stroking());
        assert_eq!(element.take_ops(), vec![DrawOp::ClosePath]);
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let (mut engine, element) = engine();
        engine.handle_pointer(&PointerEvent::Move { position: Point::new(30.0, 40.0) });
        engine.handle_pointer(&PointerEvent::Up { position: Point::new(30.0, 40.0) });
        assert_eq!(element.op_count(), 0);
        assert_eq!(engine.state(), InkState::Idle);
    }

    #[test]
    fn test_leave_ends_stroke() {
        let (mut engine, _element) = engine();
        engine.handle_pointer(&PointerEvent::Down { position: Point::new(15.0, 25.0) });
        engine.handle_pointer(&PointerEvent::Leave { position: Point::new(300.0, 25.0) });
        assert!(!engine.is_stroking());
    }

    #[test]
    fn test_touch_stroke_suppresses_scrolling() {
        let (mut engine, element) = engine();

        let response = engine.handle_touch(&TouchEvent::start(vec![Point::new(20.0, 30.0)]));
        assert_eq!(response, EventResponse::CONSUME);

        let response = engine.handle_touch(&TouchEvent::moved(vec![Point::new(25.0, 35.0)]));
        assert_eq!(response, EventResponse::CONSUME);

        let response = engine.handle_touch(&TouchEvent::end(vec![Point::new(25.0, 35.0)], Vec::new()));
        assert_eq!(response, EventResponse::PASS);
        assert!(!engine.is_stroking());

        let ops = element.ops();
        assert_eq!(ops.first(), Some(&DrawOp::BeginPath));
        assert!(ops.contains(&DrawOp::LineTo(Point::new(15.0, 15.0))));
        assert_eq!(ops.last(), Some(&DrawOp::ClosePath));
    }

    #[test]
    fn test_touch_cancel_ends_stroke() {
        let (mut engine, element) = engine();
        engine.handle_touch(&TouchEvent::start(vec![Point::new(20.0, 30.0)]));
        engine.handle_touch(&TouchEvent::moved(vec![Point::new(25.0, 35.0)]));
        assert!(engine.is_stroking());

        let response = engine.handle_touch(&TouchEvent::cancel(vec![Point::new(25.0, 35.0)]));
        assert_eq!(response, EventResponse::PASS);
        assert_eq!(engine.state(), InkState::Idle);
        assert_eq!(element.ops().last(), Some(&DrawOp::ClosePath));

        // Later moves no longer draw.
        element.clear_ops();
        engine.handle_touch(&TouchEvent::moved(vec![Point::new(40.0, 50.0)]));
        assert_eq!(element.op_count(), 0);
    }

    #[test]
    fn test_touch_move_while_idle_passes_through() {
        let (mut engine, _element) = engine();
        let response = engine.handle_touch(&TouchEvent::moved(vec![Point::new(25.0, 35.0)]));
        assert_eq!(response, EventResponse::PASS);
    }

    #[test]
    fn test_custom_style() {
        let element = RecordingElement::<()>::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut engine = InkEngine::new(Surface::new(element.clone())).with_style(InkStyle {
            color: "#123456".to_string(),
            line_width: 5.0,
        });
        engine.initialize();
        engine.handle_pointer(&PointerEvent::Down { position: Point::new(1.0, 1.0) });
        engine.handle_pointer(&PointerEvent::Move { position: Point::new(2.0, 2.0) });
        let ops = element.ops();
        assert!(ops.contains(&DrawOp::StrokeStyle("#123456".to_string())));
        assert!(ops.contains(&DrawOp::LineWidth(5.0)));
    }

    #[test]
    fn test_unavailable_context_draws_nothing() {
        let element = RecordingElement::<()>::without_context(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut engine = InkEngine::new(Surface::new(element.clone()));
        assert!(!engine.initialize());
        engine.handle_pointer(&PointerEvent::Down { position: Point::new(1.0, 1.0) });
        engine.handle_pointer(&PointerEvent::Move { position: Point::new(2.0, 2.0) });
        assert!(!engine.is_stroking());
        assert_eq!(
            engine.handle_touch(&TouchEvent::start(vec![Point::new(1.0, 1.0)])),
            EventResponse::PASS
        );
        assert_eq!(element.op_count(), 0);
    }

    #[test]
    fn test_teardown_ends_stroke_and_clears() {
        let (mut engine, element) = engine();
        engine.handle_pointer(&PointerEvent::Down { position: Point::new(15.0, 25.0) });
        element.clear_ops();
        engine.teardown();
        assert!(!engine.is_stroking());
        assert_eq!(
            element.ops(),
            vec![DrawOp::ClosePath, DrawOp::ClearRect(Rect::new(0.0, 0.0, 200.0, 100.0))]
        );
    }

    #[test]
    fn test_new_stroke_closes_previous() {
        let (mut engine, element) = engine();
        engine.handle_pointer(&PointerEvent::Down { position: Point::new(15.0, 25.0) });
        element.clear_ops();
        engine.handle_pointer(&PointerEvent::Down { position: Point::new(20.0, 30.0) });
        assert_eq!(
            element.ops(),
            vec![
                DrawOp::ClosePath,
                DrawOp::BeginPath,
                DrawOp::MoveTo(Point::new(10.0, 10.0)),
            ]
        );
    }
}
