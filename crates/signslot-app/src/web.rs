//! WebAssembly entry point.

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Info).expect("Failed to initialize logger");

    log::info!("SignSlot {} loaded", env!("CARGO_PKG_VERSION"));
}
