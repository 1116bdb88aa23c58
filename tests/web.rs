#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use std::cell::Cell;

use av1_player_wasm::config::ids;
use av1_player_wasm::overlay_text::{ACK_DURATION_MS, SENT_LABEL};
use av1_player_wasm::recording::{CAPTURE_MIME, TIMER_RESET_LABEL};
use av1_player_wasm::wasm::app;
use av1_player_wasm::wasm::dispatcher::{CommandTransport, OverlayTextDispatcher};
use av1_player_wasm::wasm::player::StreamController;
use av1_player_wasm::wasm::recorder::{assemble_capture, discard_capture, Recorder, RecorderUi};
use av1_player_wasm::{OverlayMode, PlayerConfig, PlayerError};
use js_sys::{Array, Promise, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Blob, Element, HtmlCanvasElement, HtmlSourceElement, HtmlVideoElement, MediaRecorder};

wasm_bindgen_test_configure!(run_in_browser);

const MEDIA_BASE: &str = "http://127.0.0.1:9/axis-cgi/media.cgi";
const PARAM_BASE: &str = "http://127.0.0.1:9/axis-cgi/param.cgi";

fn make<T: JsCast>(tag: &str) -> T {
    web_sys::window()
        .unwrap()
        .document()
        .unwrap()
        .create_element(tag)
        .unwrap()
        .dyn_into::<T>()
        .unwrap()
}

struct Fixture {
    controller: StreamController,
    source: HtmlSourceElement,
    status: Element,
    controls: Vec<Element>,
}

fn fixture(buttons: usize) -> Fixture {
    let player: HtmlVideoElement = make("video");
    player.set_muted(true);
    let source: HtmlSourceElement = make("source");
    player.append_child(&source).unwrap();
    let status: Element = make("p");
    let controls: Vec<Element> = (0..buttons).map(|_| make("button")).collect();
    Fixture {
        controller: StreamController::new(
            player,
            source.clone(),
            status.clone(),
            controls.clone(),
            MEDIA_BASE,
        ),
        source,
        status,
        controls,
    }
}

fn active_count(controls: &[Element]) -> usize {
    controls
        .iter()
        .filter(|c| c.class_list().contains("active"))
        .count()
}

async fn sleep(ms: i32) {
    let promise = Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
fn selecting_a_mode_points_source_at_it() {
    let f = fixture(4);
    let modes = [OverlayMode::Off, OverlayMode::Text, OverlayMode::Graphics, OverlayMode::All];

    for (mode, control) in modes.iter().zip(&f.controls) {
        f.controller.select_overlay(mode, Some(control));
        let src = f.source.src();
        assert!(src.ends_with(&format!("overlays={}", mode.as_str())), "{src}");
        assert_eq!(active_count(&f.controls), 1);
        assert!(control.class_list().contains("active"));
    }
}

#[wasm_bindgen_test]
fn initial_load_shows_off() {
    let f = fixture(2);
    f.controller.select_overlay(&OverlayMode::default(), Some(&f.controls[0]));
    assert!(f.source.src().ends_with("overlays=off"));
    assert_eq!(
        f.status.text_content().as_deref(),
        Some("Stream Active: Overlays = OFF")
    );
}

#[wasm_bindgen_test]
fn programmatic_selection_without_control_clears_highlight() {
    let f = fixture(3);
    f.controller.select_overlay(&OverlayMode::All, Some(&f.controls[2]));
    f.controller.select_overlay(&OverlayMode::Text, None);
    assert_eq!(active_count(&f.controls), 0);
    assert_eq!(
        f.status.text_content().as_deref(),
        Some("Stream Active: Overlays = TEXT")
    );
}

#[wasm_bindgen_test]
fn recording_needs_loaded_data() {
    let player: HtmlVideoElement = make("video");
    let ui = RecorderUi {
        button: make("button"),
        label: make("span"),
        timer: make("span"),
    };
    ui.label.set_text_content(Some("Start Recording"));
    ui.timer.set_text_content(Some(TIMER_RESET_LABEL));
    let label = ui.label.clone();
    let button = ui.button.clone();

    let recorder = Recorder::new(web_sys::window().unwrap(), player.into(), ui);
    assert_eq!(recorder.start(), Err(PlayerError::NothingToRecord));
    assert!(!recorder.is_recording());
    assert_eq!(label.text_content().as_deref(), Some("Start Recording"));
    assert!(!button.class_list().contains("recording"));
    assert_eq!(recorder.stop(), Err(PlayerError::NotRecording));
}

#[derive(Clone, Default)]
struct CapturingTransport {
    urls: Rc<RefCell<Vec<String>>>,
}

impl CommandTransport for CapturingTransport {
    fn send(&self, url: &str) -> Promise {
        self.urls.borrow_mut().push(url.to_string());
        Promise::resolve(&JsValue::UNDEFINED)
    }
}

#[wasm_bindgen_test(async)]
async fn overlay_text_sends_once_and_acknowledges() {
    let transport = CapturingTransport::default();
    let button: Element = make("button");
    button.set_text_content(Some("Update Text"));
    let dispatcher = Rc::new(OverlayTextDispatcher::new(
        transport.clone(),
        PARAM_BASE,
        Some(button.clone()),
    ));

    assert!(!dispatcher.send(""));
    assert!(transport.urls.borrow().is_empty());

    assert!(dispatcher.send("Hello"));
    let urls = transport.urls.borrow().clone();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("Image.I0.Text.Text=Hello"));

    sleep(50).await;
    assert_eq!(button.text_content().as_deref(), Some(SENT_LABEL));
}

#[wasm_bindgen_test(async)]
async fn acknowledgment_reverts_after_two_seconds() {
    let button: Element = make("button");
    button.set_text_content(Some("Update Text"));
    let dispatcher = Rc::new(OverlayTextDispatcher::new(
        CapturingTransport::default(),
        PARAM_BASE,
        Some(button.clone()),
    ));

    assert!(dispatcher.send("Hello"));
    sleep(ACK_DURATION_MS - 500).await;
    assert_eq!(button.text_content().as_deref(), Some(SENT_LABEL));
    sleep(600).await;
    assert_eq!(button.text_content().as_deref(), Some("Update Text"));
}

struct RejectingTransport;

impl CommandTransport for RejectingTransport {
    fn send(&self, _url: &str) -> Promise {
        Promise::reject(&JsValue::from_str("offline"))
    }
}

#[wasm_bindgen_test(async)]
async fn failed_overlay_update_is_reported_without_acknowledging() {
    let button: Element = make("button");
    button.set_text_content(Some("Update Text"));
    let failures = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&failures);
    let dispatcher = Rc::new(
        OverlayTextDispatcher::new(RejectingTransport, PARAM_BASE, Some(button.clone()))
            .on_failure(move |e| seen.borrow_mut().push(e.clone())),
    );

    assert!(dispatcher.send("Hello"));
    sleep(50).await;
    assert_eq!(
        *failures.borrow(),
        vec![PlayerError::Transport("offline".to_string())]
    );
    assert_eq!(button.text_content().as_deref(), Some("Update Text"));
}

fn bytes(data: &[u8]) -> Blob {
    Blob::new_with_u8_array_sequence(&Array::of1(&Uint8Array::from(data))).unwrap()
}

#[wasm_bindgen_test(async)]
async fn captured_chunks_join_in_order() {
    let parts = [bytes(&[1, 2]), bytes(&[3]), bytes(&[4, 5, 6])];
    let blob = assemble_capture(&parts).unwrap();

    assert_eq!(blob.size(), 6.0);
    assert_eq!(blob.type_(), CAPTURE_MIME);
    let buffer = JsFuture::from(blob.array_buffer()).await.unwrap();
    assert_eq!(Uint8Array::new(&buffer).to_vec(), vec![1, 2, 3, 4, 5, 6]);
}

#[wasm_bindgen_test(async)]
async fn discarded_capture_never_reaches_the_stop_handler() {
    let canvas: HtmlCanvasElement = make("canvas");
    let stream = canvas.capture_stream().unwrap();
    let recorder = MediaRecorder::new_with_media_stream(&stream).unwrap();

    let stopped = Rc::new(Cell::new(false));
    let flag = Rc::clone(&stopped);
    let on_stop = Closure::<dyn FnMut()>::new(move || flag.set(true));
    recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));
    recorder.start().unwrap();

    discard_capture(&recorder);
    sleep(200).await;
    assert!(!stopped.get());
    drop(on_stop);
}

#[wasm_bindgen_test]
fn background_starts_when_player_markup_is_missing() {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    let container = document.create_element("div").unwrap();
    container.set_id(ids::CANVAS_CONTAINER);
    document.body().unwrap().append_child(&container).unwrap();

    let boot = app::boot(&window, &document, &PlayerConfig::default());

    assert_eq!(boot.player.err(), Some(PlayerError::MissingElement(ids::PLAYER.to_string())));
    assert!(container.query_selector("canvas").unwrap().is_some());
    container.remove();
}
