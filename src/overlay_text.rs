//! Parameter update command for the camera's first text overlay.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Parameter holding the text of overlay slot 0.
pub const TEXT_PARAM: &str = "Image.I0.Text.Text";
pub const SENT_LABEL: &str = "Sent! ✓";
pub const ACK_DURATION_MS: i32 = 2000;

// Everything `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `<param-base>?action=update&Image.I0.Text.Text=<text>`, with the text
/// escaped the way `encodeURIComponent` does. `None` for empty input, in
/// which case nothing should be sent.
pub fn overlay_update_url(param_base: &str, text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let encoded = utf8_percent_encode(text, URI_COMPONENT);
    Some(format!("{param_base}?action=update&{TEXT_PARAM}={encoded}"))
}
