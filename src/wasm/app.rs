//! Page wiring: builds every component from the document and hooks them to
//! their buttons.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, HtmlInputElement, Window};

use crate::config::{ids, PlayerConfig};
use crate::error::{describe_js, PlayerError};
use crate::stream::OverlayMode;
use crate::wasm::dispatcher::{FetchTransport, OverlayTextDispatcher};
use crate::wasm::player::{element_by_id, StreamController};
use crate::wasm::recorder::{Recorder, RecorderUi};
use crate::wasm::render;

const LOADER_DELAY_MS: i32 = 1500;
const LOADER_FADE_MS: i32 = 500;

/// Reads overrides from `<body data-*>`.
pub fn read_config(document: &Document) -> PlayerConfig {
    let dataset = document.body().map(|b| b.dataset());
    PlayerConfig::default().with_overrides(|key| dataset.as_ref().and_then(|d| d.get(key)))
}

/// Everything the page's controls act on.
pub struct App {
    pub stream: StreamController,
    pub recorder: Recorder,
    pub dispatcher: Rc<OverlayTextDispatcher<FetchTransport>>,
    text_input: HtmlInputElement,
}

impl App {
    pub fn mount(window: &Window, document: &Document, config: &PlayerConfig) -> Result<Rc<Self>, PlayerError> {
        let stream = StreamController::from_document(document, &config.media_url())?;
        let recorder = Recorder::new(
            window.clone(),
            stream.player().clone().into(),
            RecorderUi::from_document(document)?,
        );
        let send_button = document
            .query_selector(ids::SEND_BUTTON)
            .map_err(|e| PlayerError::from_js(&e))?;
        let dispatcher = Rc::new(OverlayTextDispatcher::new(
            FetchTransport::new(window.clone()),
            config.param_url(),
            send_button.clone(),
        ));
        let text_input = element_by_id::<HtmlInputElement>(document, ids::CUSTOM_TEXT)?;

        let app = Rc::new(Self {
            stream,
            recorder,
            dispatcher,
            text_input,
        });
        app.bind_controls(document, send_button)?;
        log::debug!("player mounted against {}", config.camera_host);
        Ok(app)
    }

    /// Page-load selection: mode `off` on its button, or on whichever
    /// control the markup marks active.
    pub fn select_default_overlay(&self) {
        let mode = OverlayMode::Off;
        let controls = self.stream.controls();
        let control = controls
            .iter()
            .find(|c| c.get_attribute(ids::OVERLAY_ATTR).as_deref() == Some(mode.as_str()))
            .or_else(|| controls.iter().find(|c| c.class_list().contains(ids::ACTIVE_CLASS)));
        self.stream.select_overlay(&mode, control);
    }

    fn bind_controls(self: &Rc<Self>, document: &Document, send_button: Option<Element>) -> Result<(), PlayerError> {
        for control in self.stream.controls() {
            let Some(raw) = control.get_attribute(ids::OVERLAY_ATTR) else {
                log::warn!("overlay control without {} ignored", ids::OVERLAY_ATTR);
                continue;
            };
            let mode = OverlayMode::parse(&raw);
            let app = Rc::clone(self);
            let target = control.clone();
            on_click(control, move || app.stream.select_overlay(&mode, Some(&target)))?;
        }

        let record_button = element_by_id::<Element>(document, ids::RECORD_BUTTON)?;
        let app = Rc::clone(self);
        on_click(&record_button, move || app.recorder.toggle())?;

        match send_button {
            Some(button) => {
                let app = Rc::clone(self);
                on_click(&button, move || {
                    app.dispatcher.send(&app.text_input.value());
                })?;
            }
            None => log::warn!("no {} on the page, overlay text disabled", ids::SEND_BUTTON),
        }
        Ok(())
    }
}

/// What came up at page load. The player and the background start
/// independently, so either can fail without taking the other down.
pub struct Boot {
    pub player: Result<Rc<App>, PlayerError>,
    pub background: Result<(), JsValue>,
}

pub fn boot(window: &Window, document: &Document, config: &PlayerConfig) -> Boot {
    let player = App::mount(window, document, config);
    if let Ok(app) = &player {
        app.select_default_overlay();
    }
    if let Err(e) = schedule_loader_fade(window, document) {
        log::warn!("loader fade not scheduled: {}", describe_js(&e));
    }
    Boot {
        player,
        background: start_background(document),
    }
}

/// Adds a canvas to the background container and starts the particle field.
pub fn start_background(document: &Document) -> Result<(), JsValue> {
    let container = document
        .get_element_by_id(ids::CANVAS_CONTAINER)
        .ok_or("canvas container not found")?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    container.append_child(&canvas)?;
    render::start(canvas)
}

/// Listeners live as long as the page, so their closures are leaked.
fn on_click(target: &Element, handler: impl FnMut() + 'static) -> Result<(), PlayerError> {
    let closure = Closure::<dyn FnMut()>::new(handler);
    target
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        .map_err(|e| PlayerError::from_js(&e))?;
    closure.forget();
    Ok(())
}

/// Fades the splash loader out once the page has had a moment to settle.
pub fn schedule_loader_fade(window: &Window, document: &Document) -> Result<(), JsValue> {
    let Some(loader) = document
        .get_element_by_id(ids::LOADER)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return Ok(());
    };

    let hide = {
        let loader = loader.clone();
        Closure::once_into_js(move || {
            let _ = loader.style().set_property("display", "none");
        })
    };
    let fade = {
        let window = window.clone();
        Closure::once_into_js(move || {
            let _ = loader.style().set_property("opacity", "0");
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                hide.unchecked_ref(),
                LOADER_FADE_MS,
            );
        })
    };
    window.set_timeout_with_callback_and_timeout_and_arguments_0(fade.unchecked_ref(), LOADER_DELAY_MS)?;
    Ok(())
}
