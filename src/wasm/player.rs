use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlSourceElement, HtmlVideoElement};

use crate::config::ids;
use crate::error::{describe_js, PlayerError};
use crate::stream::{status_text, stream_url, OverlayMode};

/// Switches the player between overlay variants of the live stream.
pub struct StreamController {
    player: HtmlVideoElement,
    source: HtmlSourceElement,
    status: Element,
    controls: Vec<Element>,
    media_base: String,
}

impl StreamController {
    pub fn new(
        player: HtmlVideoElement,
        source: HtmlSourceElement,
        status: Element,
        controls: Vec<Element>,
        media_base: impl Into<String>,
    ) -> Self {
        Self {
            player,
            source,
            status,
            controls,
            media_base: media_base.into(),
        }
    }

    pub fn from_document(document: &Document, media_base: &str) -> Result<Self, PlayerError> {
        let player = element_by_id::<HtmlVideoElement>(document, ids::PLAYER)?;
        let source = element_by_id::<HtmlSourceElement>(document, ids::SOURCE)?;
        let status = element_by_id::<Element>(document, ids::STATUS)?;
        let controls = query_all(document, ids::OVERLAY_CONTROLS)?;
        Ok(Self::new(player, source, status, controls, media_base))
    }

    pub fn controls(&self) -> &[Element] {
        &self.controls
    }

    pub fn player(&self) -> &HtmlVideoElement {
        &self.player
    }

    /// Points the player at `mode`'s stream and restarts playback.
    ///
    /// `control` is the button that asked for it, if any; it becomes the only
    /// active control. A rejected `play()` (autoplay policy) is only logged.
    pub fn select_overlay(&self, mode: &OverlayMode, control: Option<&Element>) {
        for c in &self.controls {
            let _ = c.class_list().remove_1(ids::ACTIVE_CLASS);
        }
        if let Some(c) = control {
            let _ = c.class_list().add_1(ids::ACTIVE_CLASS);
        }

        let url = stream_url(&self.media_base, mode);
        log::info!("Switching stream to: {url}");
        if !mode.is_recognized() {
            log::debug!("overlay mode `{mode}` is not one of the built-in variants");
        }

        self.source.set_src(&url);
        self.player.load();
        match self.player.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::info!("Autoplay prevented: {}", describe_js(&e));
                }
            }),
            Err(e) => log::info!("Autoplay prevented: {}", describe_js(&e)),
        }

        self.status.set_text_content(Some(&status_text(mode)));
    }
}

pub(crate) fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, PlayerError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| PlayerError::MissingElement(id.to_string()))
}

pub(crate) fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>, PlayerError> {
    let list = document
        .query_selector_all(selector)
        .map_err(|e| PlayerError::from_js(&e))?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}
