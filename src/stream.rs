//! Overlay modes and the stream URLs built from them.

use std::fmt;

/// Fixed query prefix: AV1 in an MP4 container, base layer only.
const STREAM_QUERY: &str = "videocodec=av1&container=mp4&videolayers=1";

/// Camera-side overlay variant composited into the stream.
///
/// Values the page doesn't know about are kept in `Other` and passed to the
/// camera unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Off,
    Text,
    Graphics,
    All,
    Other(String),
}

impl OverlayMode {
    pub fn as_str(&self) -> &str {
        match self {
            OverlayMode::Off => "off",
            OverlayMode::Text => "text",
            OverlayMode::Graphics => "graphics",
            OverlayMode::All => "all",
            OverlayMode::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "off" => OverlayMode::Off,
            "text" => OverlayMode::Text,
            "graphics" => OverlayMode::Graphics,
            "all" => OverlayMode::All,
            other => OverlayMode::Other(other.to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, OverlayMode::Other(_))
    }
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OverlayMode {
    fn from(raw: &str) -> Self {
        OverlayMode::parse(raw)
    }
}

/// `<base>?videocodec=av1&container=mp4&videolayers=1&overlays=<mode>`.
///
/// The mode is substituted as-is, without escaping.
pub fn stream_url(base: &str, mode: &OverlayMode) -> String {
    format!("{base}?{STREAM_QUERY}&overlays={}", mode.as_str())
}

pub fn status_text(mode: &OverlayMode) -> String {
    format!("Stream Active: Overlays = {}", mode.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://root@10.176.12.35/axis-cgi/media.cgi";

    #[test]
    fn overlays_parameter_tracks_mode() {
        for mode in [OverlayMode::Off, OverlayMode::Text, OverlayMode::Graphics, OverlayMode::All] {
            let url = stream_url(BASE, &mode);
            let overlays = url.rsplit_once("overlays=").map(|(_, m)| m);
            assert_eq!(overlays, Some(mode.as_str()));
            assert!(url.starts_with(BASE));
            assert!(url.contains("?videocodec=av1&container=mp4&videolayers=1&"));
        }
    }

    #[test]
    fn default_mode_is_off() {
        let mode = OverlayMode::default();
        assert!(stream_url(BASE, &mode).ends_with("overlays=off"));
        assert_eq!(status_text(&mode), "Stream Active: Overlays = OFF");
    }

    #[test]
    fn unknown_modes_pass_through_verbatim() {
        let mode = OverlayMode::from("Weird Value&x=1");
        assert!(!mode.is_recognized());
        assert!(stream_url(BASE, &mode).ends_with("overlays=Weird Value&x=1"));
        assert_eq!(status_text(&mode), "Stream Active: Overlays = WEIRD VALUE&X=1");
    }

    #[test]
    fn parse_round_trips_known_names() {
        assert_eq!(OverlayMode::parse("all"), OverlayMode::All);
        assert_eq!(OverlayMode::parse("text").to_string(), "text");
    }
}
