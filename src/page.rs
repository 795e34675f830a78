use tauri::{AppHandle, Manager, Webview};

use crate::audio_probe::AudioDeviceState;
use crate::recording::{PendingAction, RecordingState};

/// Shell integration script injected into the hosted page. The script is
/// idempotent; re-injecting after a reload or SPA navigation is safe.
const PAGE_SCRIPT: &str = include_str!("page/shell.js");

pub fn inject(webview: &Webview) {
    if let Err(e) = webview.eval(PAGE_SCRIPT) {
        log::error!("failed to inject page script: {}", e);
    }
}

fn eval_on_main(app: &AppHandle, script: &str) {
    if let Some(window) = app.get_webview_window("main") {
        if let Err(e) = window.eval(script) {
            log::warn!("page eval failed: {}", e);
        }
    }
}

pub fn reload(app: &AppHandle) {
    log::info!("reloading hosted page");
    eval_on_main(app, "window.location.reload()");
}

/// Ask the page script to locate and click the control for `action`. The page
/// answers through the `locate_button` / `page_action_result` commands.
pub fn dispatch(app: &AppHandle, action: PendingAction) {
    let script = format!(
        "window.__voicedock && window.__voicedock.dispatch({})",
        serde_json::json!(action.as_str())
    );
    eval_on_main(app, &script);
}

fn update_banner(app: &AppHandle, payload: serde_json::Value) {
    let script = format!(
        "window.__voicedock && window.__voicedock.updateBanner({})",
        payload
    );
    eval_on_main(app, &script);
}

pub fn banner_recording_state(app: &AppHandle, state: RecordingState) {
    update_banner(app, serde_json::json!({ "state": state.label() }));
}

pub fn banner_microphone(app: &AppHandle, label: &str) {
    update_banner(app, serde_json::json!({ "microphone": label }));
}

pub fn banner_system_audio(app: &AppHandle, state: &AudioDeviceState) {
    let line = format!("{} ({:.0}%)", state.name, state.level * 100.0);
    update_banner(app, serde_json::json!({ "input": line }));
}

pub fn banner_notice(app: &AppHandle, message: &str) {
    update_banner(app, serde_json::json!({ "notice": message }));
}
