//! Browser entry point for landkit
//!
//! Load the generated module from the landing page; it wires every
//! component against the live document on `DOMContentLoaded`.

mod animator;
mod dom;
mod runtime;

pub use animator::GsapAnimator;
pub use dom::WebDom;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Without a tracing subscriber, `tracing` events are forwarded to `log`
    let _ = console_log::init_with_level(log::Level::Info);
    runtime::start()
}
