use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, Document, Element, HtmlAnchorElement, HtmlMediaElement,
    MediaRecorder, MediaRecorderOptions, MediaStream, Url, Window,
};

use crate::config::ids;
use crate::error::{describe_js, PlayerError};
use crate::recording::{
    capture_filename, format_elapsed, Chunk, ChunkBuffer, RecordingSession, CAPTURE_MIME,
    PREFERRED_RECORDER_MIME, TIMER_INTERVAL_MS, TIMER_RESET_LABEL,
};
use crate::wasm::logging::alert_and_log;
use crate::wasm::player::element_by_id;

const START_LABEL: &str = "Start Recording";
const STOP_LABEL: &str = "Stop Recording";
/// `HTMLMediaElement.HAVE_NOTHING`
const HAVE_NOTHING: u16 = 0;

#[wasm_bindgen]
extern "C" {
    // `captureStream` on media elements isn't exposed by web-sys yet.
    #[wasm_bindgen(extends = HtmlMediaElement)]
    type CapturableMedia;

    #[wasm_bindgen(method, catch, js_name = captureStream)]
    fn capture_stream(this: &CapturableMedia) -> Result<MediaStream, JsValue>;
}

impl Chunk for Blob {
    fn byte_len(&self) -> f64 {
        self.size()
    }
}

/// Recorder widgets: toggle button, its label and the elapsed-time display.
pub struct RecorderUi {
    pub button: Element,
    pub label: Element,
    pub timer: Element,
}

impl RecorderUi {
    pub fn from_document(document: &Document) -> Result<Self, PlayerError> {
        Ok(Self {
            button: element_by_id(document, ids::RECORD_BUTTON)?,
            label: element_by_id(document, ids::RECORD_LABEL)?,
            timer: element_by_id(document, ids::RECORD_TIMER)?,
        })
    }

    fn show_recording(&self) {
        let _ = self.button.class_list().add_1(ids::RECORDING_CLASS);
        self.label.set_text_content(Some(STOP_LABEL));
        let _ = self.timer.class_list().remove_1(ids::HIDDEN_CLASS);
    }

    fn show_idle(&self) {
        let _ = self.button.class_list().remove_1(ids::RECORDING_CLASS);
        self.label.set_text_content(Some(START_LABEL));
        let _ = self.timer.class_list().add_1(ids::HIDDEN_CLASS);
        self.timer.set_text_content(Some(TIMER_RESET_LABEL));
    }
}

struct ActiveCapture {
    recorder: MediaRecorder,
    timer_handle: i32,
    _tick: Closure<dyn FnMut()>,
}

/// Records whatever the player is showing and downloads it on stop.
///
/// Each capture owns its chunk buffer, so a stop event that lands after a
/// new session has begun still saves only its own chunks.
pub struct Recorder {
    window: Window,
    media: HtmlMediaElement,
    ui: RecorderUi,
    session: RefCell<RecordingSession>,
    active: RefCell<Option<ActiveCapture>>,
}

impl Recorder {
    pub fn new(window: Window, media: HtmlMediaElement, ui: RecorderUi) -> Self {
        Self {
            window,
            media,
            ui,
            session: RefCell::new(RecordingSession::new()),
            active: RefCell::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.borrow().is_recording()
    }

    /// Click handler for the record button.
    pub fn toggle(&self) {
        let result = if self.is_recording() { self.stop() } else { self.start() };
        if let Err(err) = result {
            match err {
                PlayerError::NothingToRecord | PlayerError::Capture(_) => alert_and_log(&err),
                other => log::warn!("{other}"),
            }
        }
    }

    pub fn start(&self) -> Result<(), PlayerError> {
        let has_data = self.media.ready_state() != HAVE_NOTHING;
        self.session.borrow().check_start(has_data)?;

        let now = js_sys::Date::now();
        let recorder = self.open_recorder(now)?;

        let tick = {
            let timer = self.ui.timer.clone();
            Closure::<dyn FnMut()>::new(move || {
                let label = format_elapsed(js_sys::Date::now() - now);
                timer.set_text_content(Some(&label));
            })
        };
        let timer_handle = match self.window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            TIMER_INTERVAL_MS,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                discard_capture(&recorder);
                return Err(PlayerError::from_js(&e));
            }
        };

        self.session.borrow_mut().begin(now)?;
        self.ui.show_recording();
        *self.active.borrow_mut() = Some(ActiveCapture {
            recorder,
            timer_handle,
            _tick: tick,
        });
        log::info!("Recording started...");
        Ok(())
    }

    pub fn stop(&self) -> Result<(), PlayerError> {
        self.session.borrow_mut().end()?;
        let active = self.active.borrow_mut().take();

        if let Some(capture) = active {
            if let Err(e) = capture.recorder.stop() {
                log::error!("MediaRecorder.stop failed: {}", describe_js(&e));
            }
            self.window.clear_interval_with_handle(capture.timer_handle);
        }
        self.ui.show_idle();
        log::info!("Recording stopped.");
        Ok(())
    }

    /// Captures the player, wires chunk and stop handlers and starts the
    /// `MediaRecorder`. Nothing in `self` changes if this fails.
    /// `started_at_ms` ends up in the download name.
    fn open_recorder(&self, started_at_ms: f64) -> Result<MediaRecorder, PlayerError> {
        let capture_err = |e: JsValue| PlayerError::Capture(describe_js(&e));

        let stream = self
            .media
            .unchecked_ref::<CapturableMedia>()
            .capture_stream()
            .map_err(capture_err)?;
        let options = MediaRecorderOptions::new();
        options.set_mime_type(recorder_mime());
        let recorder =
            MediaRecorder::new_with_media_stream_and_media_recorder_options(&stream, &options)
                .map_err(capture_err)?;

        let chunks = Rc::new(RefCell::new(ChunkBuffer::<Blob>::new()));
        let on_data = {
            let chunks = chunks.clone();
            Closure::<dyn FnMut(BlobEvent)>::new(move |event: BlobEvent| {
                if let Some(blob) = event.data() {
                    chunks.borrow_mut().push(blob);
                }
            })
        };
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));

        // The stop event follows the last dataavailable, so the data handler
        // can be released from inside it.
        let on_stop = {
            let recorder = recorder.clone();
            let document = self.window.document();
            Closure::once_into_js(move || {
                recorder.set_ondataavailable(None);
                recorder.set_onstop(None);
                drop(on_data);
                let parts = chunks.borrow_mut().take();
                match document {
                    Some(document) => {
                        if let Err(err) = save_recording(&document, &parts, started_at_ms) {
                            log::error!("Saving recording failed: {err}");
                        }
                    }
                    None => log::error!("Saving recording failed: no document"),
                }
            })
        };
        recorder.set_onstop(Some(on_stop.unchecked_ref()));

        recorder.start().map_err(capture_err)?;
        Ok(recorder)
    }
}

/// Stops `recorder` without running its stop handler, so nothing is saved.
pub fn discard_capture(recorder: &MediaRecorder) {
    recorder.set_onstop(None);
    recorder.set_ondataavailable(None);
    if let Err(e) = recorder.stop() {
        log::warn!("MediaRecorder.stop failed: {}", describe_js(&e));
    }
}

fn recorder_mime() -> &'static str {
    if MediaRecorder::is_type_supported(PREFERRED_RECORDER_MIME) {
        PREFERRED_RECORDER_MIME
    } else {
        log::debug!("{PREFERRED_RECORDER_MIME} unsupported, recording {CAPTURE_MIME}");
        CAPTURE_MIME
    }
}

/// Joins chunks, in order, into one `video/webm` blob.
pub fn assemble_capture(parts: &[Blob]) -> Result<Blob, PlayerError> {
    let sequence = parts.iter().collect::<js_sys::Array>();
    let props = BlobPropertyBag::new();
    props.set_type(CAPTURE_MIME);
    Blob::new_with_blob_sequence_and_options(&sequence, &props).map_err(|e| PlayerError::from_js(&e))
}

/// Downloads the session's chunks as `av1_capture_<started_at_ms>.webm`.
pub fn save_recording(document: &Document, parts: &[Blob], started_at_ms: f64) -> Result<(), PlayerError> {
    let js_err = |e: JsValue| PlayerError::from_js(&e);

    let blob = assemble_capture(parts)?;

    let url = Url::create_object_url_with_blob(&blob).map_err(js_err)?;
    let anchor = document
        .create_element("a")
        .map_err(js_err)?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| PlayerError::Js("anchor cast failed".to_string()))?;
    let body = document
        .body()
        .ok_or_else(|| PlayerError::MissingElement("body".to_string()))?;

    anchor.style().set_property("display", "none").map_err(js_err)?;
    anchor.set_href(&url);
    anchor.set_download(&capture_filename(started_at_ms));
    body.append_child(&anchor).map_err(js_err)?;
    anchor.click();
    anchor.remove();

    let _ = Url::revoke_object_url(&url);
    log::info!("Recording saved ({} chunks, {} bytes).", parts.len(), blob.size());
    Ok(())
}
