#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod config;
pub mod error;
pub mod overlay_text;
pub mod particles;
pub mod recording;
pub mod scene;
pub mod stream;

pub use config::PlayerConfig;
pub use error::PlayerError;
pub use stream::OverlayMode;

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use wasm_bindgen::prelude::*;

    pub mod app;
    pub mod bloom;
    pub mod dispatcher;
    pub mod gl;
    pub mod logging;
    pub mod player;
    pub mod recorder;
    pub mod render;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let config = app::read_config(&document);
        logging::init(config.log_level);

        // Module scripts run after parsing, so the page is already in place.
        let boot = app::boot(&window, &document, &config);
        if let Err(e) = &boot.player {
            log::warn!("player controls not mounted: {e}");
        }
        if let Err(e) = &boot.background {
            log::warn!("background not started: {}", crate::error::describe_js(e));
        }
        Ok(())
    }
}
