use crate::error::PlayerError;

/// Routes `log` to the browser console and panics to `console.error`.
/// Safe to call more than once; later calls keep the first logger.
pub fn init(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_ok() {
        log::debug!("console logger ready at {level}");
    }
}

/// Logs a failure and shows it to the user.
pub fn alert_and_log(err: &PlayerError) {
    log::error!("{err}");
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(&err.user_message());
    }
}
