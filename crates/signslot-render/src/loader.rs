//! Synchronous image loader for native hosts.

use crate::decode::{DecodedImage, decode_data_uri};
use signslot_core::{ImageLoader, LoadCallback, LoadError};
use std::cell::Cell;

/// Decodes `data:` URIs in place and completes before `load` returns.
#[derive(Debug, Default)]
pub struct DataUriLoader {
    decoded: Cell<u64>,
    failed: Cell<u64>,
}

impl DataUriLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Images decoded successfully so far.
    pub fn decoded(&self) -> u64 {
        self.decoded.get()
    }

    /// Loads that failed so far.
    pub fn failed(&self) -> u64 {
        self.failed.get()
    }
}

impl ImageLoader for DataUriLoader {
    type Image = DecodedImage;

    fn load(&self, source: &str, done: LoadCallback<DecodedImage>) {
        if source.is_empty() {
            self.failed.set(self.failed.get() + 1);
            done(Err(LoadError::EmptySource));
            return;
        }
        match decode_data_uri(source) {
            Ok(image) => {
                self.decoded.set(self.decoded.get() + 1);
                done(Ok(image));
            }
            Err(err) => {
                self.failed.set(self.failed.get() + 1);
                done(Err(LoadError::Decode(err.to_string())));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::png_data_uri;
    use kurbo::Rect;
    use signslot_core::{
        CompositeOutcome, Compositor, DrawOp, RecordingElement, SelectionEngine, SlotRect, SlotStore, Surface,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_load_reports_result_synchronously() {
        let loader = DataUriLoader::new();
        let result = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&result);
        loader.load(
            &png_data_uri(4, 4, [0, 0, 0, 255]),
            Box::new(move |r| *sink.borrow_mut() = Some(r.map(|image| image.width))),
        );
        assert_eq!(*result.borrow(), Some(Ok(4)));
        assert_eq!(loader.decoded(), 1);
    }

    #[test]
    fn test_bad_sources_fail() {
        let loader = DataUriLoader::new();
        let errors = Rc::new(RefCell::new(Vec::new()));
        for source in ["", "data:image/png;base64,AAAA"] {
            let sink = Rc::clone(&errors);
            loader.load(source, Box::new(move |r| sink.borrow_mut().push(r.err())));
        }
        let errors = errors.borrow();
        assert_eq!(errors[0], Some(LoadError::EmptySource));
        assert!(matches!(errors[1], Some(LoadError::Decode(_))));
        assert_eq!(loader.failed(), 2);
    }

    #[test]
    fn test_compositor_draws_decoded_signature_in_one_pass() {
        let element = RecordingElement::<DecodedImage>::new(Rect::new(0.0, 0.0, 200.0, 100.0));
        let mut surface = Surface::new(element.clone());
        surface.initialize();
        let mut compositor = Compositor::new(surface, DataUriLoader::new());

        let store = SlotStore::new();
        let id = store.add(SlotRect::new(10.0, 10.0, 80.0, 40.0));
        store.set_signature(id, png_data_uri(2, 2, [255, 0, 0, 255]));
        let slot = store.get(id).unwrap();

        compositor.begin_pass();
        assert_eq!(compositor.composite(&slot), CompositeOutcome::Loading);
        compositor.finish_pass();
        assert!(compositor.drain_completions());

        compositor.begin_pass();
        assert_eq!(compositor.composite(&slot), CompositeOutcome::Drawn);
        compositor.finish_pass();
        assert_eq!(compositor.loader().decoded(), 1);
    }

    #[test]
    fn test_selection_repaint_settles_synchronous_loads() {
        let store = SlotStore::new();
        let overlay = RecordingElement::<DecodedImage>::new(Rect::new(0.0, 0.0, 200.0, 100.0));
        let images = RecordingElement::<DecodedImage>::new(Rect::new(0.0, 0.0, 200.0, 100.0));
        let compositor = Compositor::new(Surface::new(images.clone()), DataUriLoader::new());
        let mut engine = SelectionEngine::new(store.clone(), Surface::new(overlay), compositor);
        engine.initialize();

        let id = store.add(SlotRect::new(10.0, 10.0, 80.0, 40.0));
        store.set_signature(id, png_data_uri(2, 2, [0, 0, 255, 255]));
        images.clear_ops();
        engine.repaint();

        let drawn: Vec<Rect> = images
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::DrawImage { image, rect } => {
                    assert_eq!(image.pixel(0, 0), Some([0, 0, 255, 255]));
                    Some(rect)
                }
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec![Rect::new(10.0, 10.0, 90.0, 50.0)]);
    }
}
