use std::fmt;

use wasm_bindgen::JsValue;

/// Failures the front-end can run into. None of them are fatal: each is
/// either ignored, logged, or logged and shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// A required page element is absent or has the wrong type.
    MissingElement(String),
    /// Recording was requested while the player has no loaded data.
    NothingToRecord,
    AlreadyRecording,
    NotRecording,
    /// The browser refused to capture the element's stream.
    Capture(String),
    /// The overlay command never reached the camera.
    Transport(String),
    Js(String),
}

impl PlayerError {
    /// Text shown in the alert box for user-visible failures.
    pub fn user_message(&self) -> String {
        match self {
            PlayerError::NothingToRecord => "No video stream to record!".to_string(),
            PlayerError::Capture(_) => "Could not start recording. Browser security may prevent capturing cross-origin video streams.".to_string(),
            PlayerError::Transport(_) => "Failed to send command to camera.".to_string(),
            other => other.to_string(),
        }
    }

    /// Wraps a thrown JS value, keeping whatever text it renders to.
    pub fn from_js(value: &JsValue) -> Self {
        PlayerError::Js(describe_js(value))
    }
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::MissingElement(id) => write!(f, "element `{id}` not found"),
            PlayerError::NothingToRecord => write!(f, "player has no loaded data"),
            PlayerError::AlreadyRecording => write!(f, "a recording session is already active"),
            PlayerError::NotRecording => write!(f, "no recording session is active"),
            PlayerError::Capture(detail) => write!(f, "stream capture failed: {detail}"),
            PlayerError::Transport(detail) => write!(f, "overlay command failed: {detail}"),
            PlayerError::Js(detail) => write!(f, "{detail}"),
        }
    }
}

impl std::error::Error for PlayerError {}

impl From<PlayerError> for JsValue {
    fn from(err: PlayerError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort string form of a JS exception or rejection value.
pub fn describe_js(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
