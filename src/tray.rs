use tauri::{
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager, Wry,
};

use crate::audio_probe::AudioDeviceState;
use crate::recording::{PendingAction, RecordingState};

/// Handles to the tray menu items that change at runtime. Tauri menu items are
/// cheap clonable handles, so keeping them in managed state lets the poller
/// and command handlers update the menu in place instead of rebuilding it.
pub struct ShellTray {
    status_item: MenuItem<Wry>,
    record_item: MenuItem<Wry>,
    pause_item: MenuItem<Wry>,
    stop_item: MenuItem<Wry>,
    microphone_item: MenuItem<Wry>,
    system_audio_item: MenuItem<Wry>,
}

impl ShellTray {
    /// Re-label the status line and gate the action items to the legal
    /// transitions from `state`.
    pub fn set_recording_state(&self, state: RecordingState) {
        let _ = self.status_item.set_text(format!("Status: {}", state.label()));
        let _ = self.record_item.set_enabled(state.can_record());
        let _ = self.pause_item.set_enabled(state.can_pause());
        let _ = self.stop_item.set_enabled(state.can_stop());
    }

    pub fn set_microphone(&self, label: Option<&str>) {
        let text = match label {
            Some(label) => format!("Mic: {}", label),
            None => "Mic: (unknown)".to_string(),
        };
        let _ = self.microphone_item.set_text(text);
    }

    pub fn set_system_audio(&self, state: &AudioDeviceState) {
        let _ = self.system_audio_item.set_text(format!(
            "Input: {} ({:.0}%)",
            state.name,
            state.level * 100.0
        ));
    }
}

pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let show_item = MenuItem::with_id(app, "show", "Show Window", true, None::<&str>)?;
    let refresh_item = MenuItem::with_id(app, "refresh", "Refresh Page", true, None::<&str>)?;

    // Informational lines; disabled so they render as labels.
    let status_item = MenuItem::with_id(app, "status", "Status: Stopped", false, None::<&str>)?;
    let microphone_item =
        MenuItem::with_id(app, "microphone", "Mic: (unknown)", false, None::<&str>)?;
    let system_audio_item =
        MenuItem::with_id(app, "system_audio", "Input: (probing...)", false, None::<&str>)?;

    // Action items start gated to the Stopped state.
    let record_item = MenuItem::with_id(app, "record", "Start Recording", true, None::<&str>)?;
    let pause_item = MenuItem::with_id(app, "pause", "Pause Recording", false, None::<&str>)?;
    let stop_item = MenuItem::with_id(app, "stop", "Stop Recording", false, None::<&str>)?;

    let quit_item = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;

    let menu = Menu::with_items(
        app,
        &[
            &show_item,
            &refresh_item,
            &PredefinedMenuItem::separator(app)?,
            &status_item,
            &record_item,
            &pause_item,
            &stop_item,
            &PredefinedMenuItem::separator(app)?,
            &microphone_item,
            &system_audio_item,
            &PredefinedMenuItem::separator(app)?,
            &quit_item,
        ],
    )?;

    // Use the same tray icon everywhere (full-color, brand-consistent).
    // NOTE: Some platforms (notably macOS) have UI conventions around template icons,
    // but we intentionally keep it consistent with the rest of the app branding.
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon = tauri::image::Image::from_bytes(icon_bytes)?;

    let _tray = TrayIconBuilder::new()
        .icon(icon)
        .icon_as_template(false)
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(|app, event| match event.id.as_ref() {
            "show" => {
                if let Some(window) = app.get_webview_window("main") {
                    let _ = window.show();
                    let _ = window.set_focus();
                }
            }
            "refresh" => crate::page::reload(app),
            "record" => crate::dispatch_action(app, PendingAction::Record),
            "pause" => crate::dispatch_action(app, PendingAction::Pause),
            "stop" => crate::dispatch_action(app, PendingAction::Stop),
            "quit" => {
                app.exit(0);
            }
            _ => {}
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                let app = tray.app_handle();
                if let Some(window) = app.get_webview_window("main") {
                    if window.is_visible().unwrap_or(false) {
                        let _ = window.hide();
                    } else {
                        let _ = window.show();
                        let _ = window.set_focus();
                    }
                }
            }
        })
        .build(app)?;

    app.manage(ShellTray {
        status_item,
        record_item,
        pause_item,
        stop_item,
        microphone_item,
        system_audio_item,
    });

    Ok(())
}
