mod audio_probe;
mod buttons;
mod commands;
mod page;
mod poller;
mod recording;
mod shortcuts;
mod state;
mod tray;

use std::sync::Arc;

use tauri::{AppHandle, Emitter, Manager};

#[cfg(desktop)]
use tauri_plugin_global_shortcut::{Shortcut, ShortcutEvent, ShortcutState};

use audio_probe::default_probe;
use buttons::ButtonLocator;
use poller::{AudioPoller, DEFAULT_POLL_INTERVAL};
use recording::{PendingAction, RecordingState};
use state::AppState;
use tray::ShellTray;

/// Emit a system event to the frontend for debugging
fn emit_system_event(app: &AppHandle, event_type: &str, message: &str, details: Option<&str>) {
    #[derive(serde::Serialize, Clone)]
    struct SystemEvent {
        timestamp: String,
        event_type: String,
        message: String,
        details: Option<String>,
    }

    let event = SystemEvent {
        timestamp: chrono::Utc::now().to_rfc3339(),
        event_type: event_type.to_string(),
        message: message.to_string(),
        details: details.map(|s| s.to_string()),
    };

    let _ = app.emit("system-event", event);
}

/// Push a recording-state change to every surface at once: tray gating,
/// page banner, and the event stream.
pub(crate) fn refresh_recording_ui(app: &AppHandle, state: RecordingState) {
    if let Some(tray) = app.try_state::<ShellTray>() {
        tray.set_recording_state(state);
    }
    page::banner_recording_state(app, state);
    emit_system_event(app, "recording", state.label(), None);
}

/// Entry point for tray items and shortcuts. Illegal requests (pause while
/// stopped, etc.) are dropped here instead of bothering the page.
pub(crate) fn dispatch_action(app: &AppHandle, action: PendingAction) {
    let state = app.state::<AppState>();
    let current = state.recording_state();
    if recording::next_state(current, action).is_none() {
        log::debug!(
            "ignoring {} request while {}",
            action.as_str(),
            current.label()
        );
        return;
    }
    log::info!("dispatching {} to page", action.as_str());
    page::dispatch(app, action);
}

#[cfg(desktop)]
pub fn handle_shortcut_event(app: &AppHandle, shortcut: &Shortcut, event: &ShortcutEvent) {
    use shortcuts::ShortcutAction;

    if event.state != ShortcutState::Pressed {
        return;
    }

    let bindings = commands::settings::load_shortcut_bindings(app);
    match bindings.classify(shortcut) {
        Some(ShortcutAction::Record) => {
            emit_system_event(app, "shortcut", "record shortcut pressed", None);
            dispatch_action(app, PendingAction::Record);
        }
        Some(ShortcutAction::Pause) => {
            emit_system_event(app, "shortcut", "pause shortcut pressed", None);
            dispatch_action(app, PendingAction::Pause);
        }
        Some(ShortcutAction::Stop) => {
            emit_system_event(app, "shortcut", "stop shortcut pressed", None);
            dispatch_action(app, PendingAction::Stop);
        }
        Some(ShortcutAction::Reload) => {
            emit_system_event(app, "shortcut", "page reload requested", None);
            page::reload(app);
        }
        None => {
            log::debug!("unbound shortcut fired: {}", shortcut);
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut builder = tauri::Builder::default();

    #[cfg(desktop)]
    {
        builder = builder.plugin(build_global_shortcut_plugin());
    }

    builder
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_store::Builder::new().build())
        .manage(AppState::default())
        .manage(ButtonLocator::default())
        .manage(Arc::new(AudioPoller::new(default_probe())))
        .invoke_handler(tauri::generate_handler![
            commands::recording::locate_button,
            commands::recording::page_action_result,
            commands::recording::get_recording_state,
            commands::audio::get_audio_status,
            commands::audio::get_mute_status,
            commands::audio::toggle_mute,
            commands::audio::update_microphone_label,
            commands::settings::get_shortcut_bindings,
            commands::settings::set_shortcut_bindings,
            commands::settings::register_shortcuts,
        ])
        .on_page_load(|webview, payload| {
            // Re-inject on every navigation; the script guards itself.
            if webview.label() == "main"
                && matches!(payload.event(), tauri::webview::PageLoadEvent::Finished)
            {
                log::info!("page loaded: {}", payload.url());
                page::inject(webview);
            }
        })
        .setup(|app| {
            tray::setup_tray(app.handle())?;

            // Register global shortcuts from the store (defaults if absent)
            #[cfg(desktop)]
            {
                let handle = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    if let Err(e) = commands::settings::register_shortcuts(handle).await {
                        log::error!("failed to register shortcuts: {}", e);
                    }
                });
            }

            // Start the system-audio poll; the callback fans changes out to
            // state, tray, banner and the event stream.
            let poller = app.state::<Arc<AudioPoller>>().inner().clone();
            let handle = app.handle().clone();
            poller.start_monitoring(DEFAULT_POLL_INTERVAL, move |device| {
                if let Some(tray) = handle.try_state::<ShellTray>() {
                    tray.set_system_audio(&device);
                }
                page::banner_system_audio(&handle, &device);
                emit_system_event(
                    &handle,
                    "audio",
                    &device.name,
                    Some(&format!("level {:.0}%", device.level * 100.0)),
                );
            });

            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(desktop)]
fn build_global_shortcut_plugin() -> tauri::plugin::TauriPlugin<tauri::Wry> {
    // Just initialize the plugin - shortcuts will be registered in setup() after store is available
    tauri_plugin_global_shortcut::Builder::new().build()
}
