use std::rc::Rc;

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, RequestInit, RequestMode, Window};

use crate::error::{describe_js, PlayerError};
use crate::overlay_text::{overlay_update_url, ACK_DURATION_MS, SENT_LABEL};
use crate::wasm::logging::alert_and_log;

/// Issues a camera command. The returned promise settles when the request
/// completes at the network level; the response itself is never inspected.
pub trait CommandTransport {
    fn send(&self, url: &str) -> Promise;
}

/// `fetch` in `no-cors` mode: the response is opaque, so an HTTP error
/// status looks exactly like success.
pub struct FetchTransport {
    window: Window,
}

impl FetchTransport {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl CommandTransport for FetchTransport {
    fn send(&self, url: &str) -> Promise {
        let init = RequestInit::new();
        init.set_mode(RequestMode::NoCors);
        self.window.fetch_with_str_and_init(url, &init)
    }
}

/// Pushes custom text to the camera's text overlay.
pub struct OverlayTextDispatcher<T> {
    transport: T,
    param_base: String,
    ack_control: Option<Element>,
    idle_label: Option<String>,
    on_failure: Box<dyn Fn(&PlayerError)>,
}

impl<T: CommandTransport + 'static> OverlayTextDispatcher<T> {
    /// `ack_control` briefly shows a confirmation after each send.
    pub fn new(transport: T, param_base: impl Into<String>, ack_control: Option<Element>) -> Self {
        let idle_label = ack_control.as_ref().and_then(|c| c.text_content());
        Self {
            transport,
            param_base: param_base.into(),
            ack_control,
            idle_label,
            on_failure: Box::new(alert_and_log),
        }
    }

    /// Replaces the default alert shown when a request fails.
    pub fn on_failure(mut self, report: impl Fn(&PlayerError) + 'static) -> Self {
        self.on_failure = Box::new(report);
        self
    }

    /// Sends `text` unless it's empty. Returns whether a request went out;
    /// the outcome is reported later through the acknowledgment or an alert.
    pub fn send(self: &Rc<Self>, text: &str) -> bool {
        let Some(url) = overlay_update_url(&self.param_base, text) else {
            return false;
        };
        log::info!("Updating overlay text: {text}");

        let request = self.transport.send(&url);
        let this = Rc::clone(self);
        spawn_local(async move {
            match JsFuture::from(request).await {
                Ok(_) => {
                    log::info!("Overlay update command sent.");
                    this.acknowledge();
                }
                Err(e) => (this.on_failure)(&PlayerError::Transport(describe_js(&e))),
            }
        });
        true
    }

    fn acknowledge(&self) {
        let Some(control) = self.ack_control.clone() else {
            return;
        };
        control.set_text_content(Some(SENT_LABEL));

        let label = self.idle_label.clone();
        let restore = Closure::once_into_js(move || control.set_text_content(label.as_deref()));
        let scheduled = web_sys::window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                restore.unchecked_ref(),
                ACK_DURATION_MS,
            )
        });
        if let Some(Err(e)) = scheduled {
            log::warn!("could not schedule label restore: {}", describe_js(&e));
        }
    }
}
