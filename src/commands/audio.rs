use std::sync::Arc;

use tauri::{AppHandle, Manager, State};

use crate::audio_probe::{AudioDeviceState, MuteStatus};
use crate::poller::AudioPoller;
use crate::state::AppState;
use crate::tray::ShellTray;

/// Current system-audio input as seen by the poller. Falls back to a fresh
/// probe when no poll tick has run yet.
#[tauri::command]
pub fn get_audio_status(poller: State<'_, Arc<AudioPoller>>) -> AudioDeviceState {
    poller
        .latest()
        .unwrap_or_else(|| poller.current_device())
}

#[tauri::command]
pub fn get_mute_status(poller: State<'_, Arc<AudioPoller>>) -> MuteStatus {
    poller.mute_status()
}

#[tauri::command]
pub fn toggle_mute(poller: State<'_, Arc<AudioPoller>>) -> Result<MuteStatus, String> {
    let status = poller.toggle_mute().map_err(|e| e.to_string())?;
    log::info!(
        "toggled mute on '{}': now {}",
        status.source_name,
        if status.is_muted { "muted" } else { "live" }
    );
    Ok(status)
}

/// Browser-reported microphone label, pushed by the page script whenever the
/// label it sees changes. Distinct from the OS-level default input the poller
/// tracks.
#[tauri::command]
pub fn update_microphone_label(app: AppHandle, label: String, state: State<'_, AppState>) {
    if label.is_empty() {
        return;
    }
    if state.microphone_label().as_deref() == Some(label.as_str()) {
        return;
    }
    log::info!("page microphone: {}", label);
    state.set_microphone_label(label.clone());
    if let Some(tray) = app.try_state::<ShellTray>() {
        tray.set_microphone(Some(&label));
    }
    crate::page::banner_microphone(&app, &label);
}
