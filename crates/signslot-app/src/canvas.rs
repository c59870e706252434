//! `HtmlCanvasElement` surfaces and `HtmlImageElement` loading.

use kurbo::{Point, Rect};
use signslot_core::{DrawContext, ImageLoader, LineCap, LineJoin, LoadCallback, LoadError, SurfaceElement};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// A canvas element on the page.
#[derive(Clone)]
pub struct CanvasElement {
    canvas: HtmlCanvasElement,
}

impl CanvasElement {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl SurfaceElement for CanvasElement {
    type Context = Canvas2d;

    fn display_rect(&self) -> Option<Rect> {
        if !self.canvas.is_connected() {
            return None;
        }
        let rect = self.canvas.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.right(), rect.bottom()))
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn acquire_context(&mut self) -> Option<Canvas2d> {
        self.canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .map(|ctx| Canvas2d { ctx })
    }
}

/// 2D context of a [`CanvasElement`].
pub struct Canvas2d {
    ctx: CanvasRenderingContext2d,
}

impl DrawContext for Canvas2d {
    type Image = HtmlImageElement;

    fn clear_rect(&mut self, rect: Rect) {
        self.ctx.clear_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, point: Point) {
        self.ctx.move_to(point.x, point.y);
    }

    fn line_to(&mut self, point: Point) {
        self.ctx.line_to(point.x, point.y);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.ctx.stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.ctx.set_stroke_style_str(style);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.ctx.set_fill_style_str(style);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ctx.set_line_cap(cap.as_str());
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ctx.set_line_join(join.as_str());
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let dash: js_sys::Array = segments.iter().map(|&len| JsValue::from_f64(len)).collect();
        if self.ctx.set_line_dash(&dash).is_err() {
            log::warn!("canvas rejected line dash {:?}", segments);
        }
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.ctx
            .measure_text(text)
            .map(|metrics| metrics.width())
            .unwrap_or(0.0)
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn fill_text(&mut self, text: &str, position: Point) {
        if self.ctx.fill_text(text, position.x, position.y).is_err() {
            log::warn!("canvas failed to draw text {:?}", text);
        }
    }

    fn draw_image(&mut self, image: &HtmlImageElement, rect: Rect) {
        let drawn = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
        );
        if drawn.is_err() {
            log::warn!("canvas failed to draw signature image");
        }
    }
}

/// Loads image sources through `HtmlImageElement`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlImageLoader;

/// An image element waiting for `onload` or `onerror`.
///
/// Owns both handlers; whichever fires first takes the whole value, unhooks
/// the element and drops both closures.
struct PendingImage {
    image: HtmlImageElement,
    label: String,
    done: LoadCallback<HtmlImageElement>,
    _on_load: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

type PendingSlot = Rc<RefCell<Option<PendingImage>>>;

fn settle(pending: &PendingSlot, loaded: bool) {
    let Some(PendingImage { image, label, done, .. }) = pending.borrow_mut().take() else {
        return;
    };
    image.set_onload(None);
    image.set_onerror(None);
    if loaded {
        done(Ok(image));
    } else {
        done(Err(LoadError::Failed(label)));
    }
}

impl ImageLoader for HtmlImageLoader {
    type Image = HtmlImageElement;

    fn load(&self, source: &str, done: LoadCallback<HtmlImageElement>) {
        if source.is_empty() {
            done(Err(LoadError::EmptySource));
            return;
        }
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(_) => {
                done(Err(LoadError::Failed("cannot create image element".to_string())));
                return;
            }
        };

        let pending: PendingSlot = Rc::default();
        let on_load = {
            let pending = Rc::clone(&pending);
            Closure::once(Box::new(move || settle(&pending, true)) as Box<dyn FnOnce()>)
        };
        let on_error = {
            let pending = Rc::clone(&pending);
            Closure::once(Box::new(move || settle(&pending, false)) as Box<dyn FnOnce()>)
        };
        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        *pending.borrow_mut() = Some(PendingImage {
            image: image.clone(),
            label: truncate_source(source),
            done,
            _on_load: on_load,
            _on_error: on_error,
        });
        image.set_src(source);
    }
}

/// Data URLs can be huge; keep log and error messages readable.
fn truncate_source(source: &str) -> String {
    const MAX: usize = 48;
    match source.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &source[..end]),
        None => source.to_string(),
    }
}
