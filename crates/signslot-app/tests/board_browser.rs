#![cfg(target_arch = "wasm32")]

use signslot_app::{HtmlImageLoader, SignBoard};
use signslot_core::{ImageLoader, LoadError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::HtmlImageElement;

wasm_bindgen_test_configure!(run_in_browser);

const PIXEL_PNG: &str =
    "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

async fn load(source: &str) -> Result<HtmlImageElement, LoadError> {
    let outcome: Rc<RefCell<Option<Result<HtmlImageElement, LoadError>>>> = Rc::default();
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let outcome = Rc::clone(&outcome);
        HtmlImageLoader.load(
            source,
            Box::new(move |result| {
                *outcome.borrow_mut() = Some(result);
                resolve.call0(&JsValue::NULL).unwrap();
            }),
        );
    });
    JsFuture::from(promise).await.unwrap();
    outcome.borrow_mut().take().expect("load settled")
}

fn add_canvas(id: &str) {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document.create_element("canvas").unwrap();
    canvas.set_id(id);
    document.body().unwrap().append_child(&canvas).unwrap();
}

fn options(json: &str) -> JsValue {
    js_sys::JSON::parse(json).unwrap()
}

#[wasm_bindgen_test(async)]
async fn image_load_unhooks_element_handlers() {
    let image = load(PIXEL_PNG).await.unwrap();
    assert_eq!(image.natural_width(), 1);
    assert!(image.onload().is_none());
    assert!(image.onerror().is_none());
}

#[wasm_bindgen_test(async)]
async fn broken_image_reports_truncated_source() {
    let source = format!("data:image/png;base64,{}", "A".repeat(4096));
    match load(&source).await {
        Err(LoadError::Failed(label)) => {
            assert!(label.starts_with("data:image/png;base64,"));
            assert!(label.len() < 64);
        }
        other => panic!("expected a failed load, got {:?}", other),
    }
}

#[wasm_bindgen_test(async)]
async fn empty_source_fails_immediately() {
    assert_eq!(load("").await.unwrap_err(), LoadError::EmptySource);
}

#[wasm_bindgen_test]
fn off_change_stops_notifications() {
    let board = SignBoard::new();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let observer = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_kind, _id| counter.set(counter.get() + 1));
    let function: js_sys::Function = observer.as_ref().unchecked_ref::<js_sys::Function>().clone();

    board.on_change(function.clone());
    board.add_slot(0.0, 0.0, 10.0, 10.0, None);
    assert_eq!(calls.get(), 1);

    assert!(board.off_change(&function));
    assert!(!board.off_change(&function));
    board.add_slot(5.0, 5.0, 10.0, 10.0, None);
    assert_eq!(calls.get(), 1);
}

#[wasm_bindgen_test]
fn failed_remount_keeps_current_mount() {
    add_canvas("remount-ink");
    add_canvas("remount-rect");
    add_canvas("remount-sig");

    let mut board = SignBoard::new();
    board
        .mount(options(
            r#"{ "inkCanvas": "remount-ink", "overlayCanvas": "remount-rect", "signatureCanvas": "remount-sig" }"#,
        ))
        .unwrap();
    assert!(board.is_mounted());

    let result = board.mount(options(
        r#"{ "inkCanvas": "remount-ink", "overlayCanvas": "remount-missing", "signatureCanvas": "remount-sig" }"#,
    ));
    assert!(result.is_err());
    assert!(board.is_mounted());
    assert!(board.ink_data_url().unwrap().is_some());

    board.unmount();
    assert!(!board.is_mounted());
}
