//! Dedicated-worker entry point: receives host commands, owns the engine and
//! the GPU renderer, and drives the animation loop.

use wasm_bindgen::prelude::*;

mod host;
mod inbound;
mod logging;
mod state;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init();
    host::install()?;
    tracing::info!("flow worker ready");
    Ok(())
}
