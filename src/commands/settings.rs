use tauri::AppHandle;

#[cfg(desktop)]
use tauri_plugin_global_shortcut::GlobalShortcutExt;

use tauri_plugin_store::StoreExt;

use crate::shortcuts::ShortcutBindings;

pub const SHORTCUTS_KEY: &str = "shortcuts";

/// Read the shortcut bindings from the settings store. A missing store file,
/// missing key, or malformed value all yield the defaults.
pub fn load_shortcut_bindings(app: &AppHandle) -> ShortcutBindings {
    ShortcutBindings::from_value(
        app.store("settings.json")
            .ok()
            .and_then(|store| store.get(SHORTCUTS_KEY)),
    )
}

#[tauri::command]
pub fn get_shortcut_bindings(app: AppHandle) -> ShortcutBindings {
    load_shortcut_bindings(&app)
}

/// Persist new bindings and re-register the global shortcuts wholesale.
#[tauri::command]
pub async fn set_shortcut_bindings(
    app: AppHandle,
    bindings: ShortcutBindings,
) -> Result<(), String> {
    let store = app
        .store("settings.json")
        .map_err(|e| format!("Failed to open settings store: {}", e))?;
    store.set(
        SHORTCUTS_KEY,
        serde_json::to_value(&bindings).map_err(|e| e.to_string())?,
    );
    store
        .save()
        .map_err(|e| format!("Failed to save settings store: {}", e))?;

    register_shortcuts(app).await
}

/// Re-register global shortcuts from the current store contents. Always
/// unregisters everything first so stale accelerators never linger.
#[cfg(desktop)]
#[tauri::command]
pub async fn register_shortcuts(app: AppHandle) -> Result<(), String> {
    let bindings = load_shortcut_bindings(&app);
    log::info!(
        "Registering shortcuts - Record: {}, Pause: {}, Stop: {}",
        bindings.record,
        bindings.pause,
        bindings.stop
    );

    let shortcut_manager = app.global_shortcut();
    shortcut_manager
        .unregister_all()
        .map_err(|e| format!("Failed to unregister shortcuts: {}", e))?;

    shortcut_manager
        .on_shortcuts(bindings.registration_set(), |app, shortcut, event| {
            crate::handle_shortcut_event(app, shortcut, &event);
        })
        .map_err(|e| format!("Failed to register shortcuts: {}", e))?;

    log::info!("Shortcuts registered successfully");
    Ok(())
}

// Stub for non-desktop platforms
#[cfg(not(desktop))]
#[tauri::command]
pub async fn register_shortcuts(_app: AppHandle) -> Result<(), String> {
    Ok(())
}
