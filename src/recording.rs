//! Recording session bookkeeping, independent of the browser APIs.
//!
//! The browser side owns the `MediaRecorder`; this module decides whether a
//! session may start or stop, collects chunks in arrival order and formats
//! the timer and download name.

use crate::error::PlayerError;

pub const CAPTURE_PREFIX: &str = "av1_capture_";
pub const CAPTURE_MIME: &str = "video/webm";
/// Preferred recorder format; `CAPTURE_MIME` is the fallback.
pub const PREFERRED_RECORDER_MIME: &str = "video/webm; codecs=vp9";
pub const TIMER_RESET_LABEL: &str = "00:00";
pub const TIMER_INTERVAL_MS: i32 = 1000;

/// Anything with a byte size; zero-sized chunks are dropped.
pub trait Chunk {
    fn byte_len(&self) -> f64;
}

impl Chunk for Vec<u8> {
    fn byte_len(&self) -> f64 {
        self.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecorderState {
    Idle,
    Recording { started_at_ms: f64 },
}

/// Idle -> Recording -> Idle. A second start while recording is rejected.
#[derive(Debug)]
pub struct RecordingSession {
    state: RecorderState,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Checks the guards that run before any capture is attempted.
    pub fn check_start(&self, has_loaded_data: bool) -> Result<(), PlayerError> {
        if self.is_recording() {
            return Err(PlayerError::AlreadyRecording);
        }
        if !has_loaded_data {
            return Err(PlayerError::NothingToRecord);
        }
        Ok(())
    }

    pub fn begin(&mut self, now_ms: f64) -> Result<(), PlayerError> {
        if self.is_recording() {
            return Err(PlayerError::AlreadyRecording);
        }
        self.state = RecorderState::Recording {
            started_at_ms: now_ms,
        };
        Ok(())
    }

    /// Returns the start time of the session that just ended.
    pub fn end(&mut self) -> Result<f64, PlayerError> {
        match self.state {
            RecorderState::Recording { started_at_ms } => {
                self.state = RecorderState::Idle;
                Ok(started_at_ms)
            }
            RecorderState::Idle => Err(PlayerError::NotRecording),
        }
    }

    pub fn elapsed_label(&self, now_ms: f64) -> Option<String> {
        match self.state {
            RecorderState::Recording { started_at_ms } => Some(format_elapsed(now_ms - started_at_ms)),
            RecorderState::Idle => None,
        }
    }
}

/// Ordered chunk accumulator for one session.
#[derive(Debug)]
pub struct ChunkBuffer<C> {
    chunks: Vec<C>,
}

impl<C> Default for ChunkBuffer<C> {
    fn default() -> Self {
        Self { chunks: Vec::new() }
    }
}

impl<C: Chunk> ChunkBuffer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk unless it's empty. Returns whether it was kept.
    pub fn push(&mut self, chunk: C) -> bool {
        if chunk.byte_len() > 0.0 {
            self.chunks.push(chunk);
            true
        } else {
            false
        }
    }

    /// Hands out everything collected so far and leaves the buffer empty.
    pub fn take(&mut self) -> Vec<C> {
        std::mem::take(&mut self.chunks)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// `mm:ss`, both zero-padded, from whole elapsed seconds.
pub fn format_elapsed(elapsed_ms: f64) -> String {
    let secs = (elapsed_ms.max(0.0) / 1000.0).floor() as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn capture_filename(epoch_ms: f64) -> String {
    format!("{CAPTURE_PREFIX}{}.webm", epoch_ms.max(0.0) as u64)
}
