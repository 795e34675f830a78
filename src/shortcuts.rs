use serde::{Deserialize, Serialize};

#[cfg(desktop)]
use std::str::FromStr;
#[cfg(desktop)]
use tauri_plugin_global_shortcut::Shortcut;

// ============================================================================
// DEFAULT ACCELERATORS - single source of truth
// ============================================================================

pub const DEFAULT_RECORD_SHORTCUT: &str = "Ctrl+Alt+R";
pub const DEFAULT_PAUSE_SHORTCUT: &str = "Ctrl+Alt+P";
pub const DEFAULT_STOP_SHORTCUT: &str = "Ctrl+Alt+S";

/// Fixed function-key bindings, always registered alongside the configurable
/// set.
pub const RECORD_FUNCTION_KEY: &str = "F10";
pub const PAUSE_FUNCTION_KEY: &str = "F11";
pub const STOP_FUNCTION_KEY: &str = "F12";

/// Reloads the hosted page.
pub const RELOAD_SHORTCUT: &str = "Ctrl+Alt+F5";

fn default_record() -> String {
    DEFAULT_RECORD_SHORTCUT.to_string()
}

fn default_pause() -> String {
    DEFAULT_PAUSE_SHORTCUT.to_string()
}

fn default_stop() -> String {
    DEFAULT_STOP_SHORTCUT.to_string()
}

/// Logical action behind a global shortcut press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Record,
    Pause,
    Stop,
    Reload,
}

/// Configurable accelerator strings for the three recording actions.
///
/// Loaded from the `shortcuts` key of the settings store; a missing file,
/// missing key, or malformed value falls back to the built-in defaults.
/// Always re-registered wholesale on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortcutBindings {
    #[serde(default = "default_record")]
    pub record: String,
    #[serde(default = "default_pause")]
    pub pause: String,
    #[serde(default = "default_stop")]
    pub stop: String,
}

impl Default for ShortcutBindings {
    fn default() -> Self {
        Self {
            record: default_record(),
            pause: default_pause(),
            stop: default_stop(),
        }
    }
}

impl ShortcutBindings {
    /// Deserialize from a stored JSON value. `None` (key absent) and values
    /// that fail to deserialize both yield the defaults; individual missing
    /// keys default per-field.
    pub fn from_value(value: Option<serde_json::Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Parse an accelerator, falling back to the built-in default when the
    /// configured string is invalid. The defaults themselves must parse.
    #[cfg(desktop)]
    fn parse_or_default(configured: &str, default: &str) -> Shortcut {
        Shortcut::from_str(configured).unwrap_or_else(|e| {
            log::warn!(
                "invalid accelerator '{}' ({:?}), using default '{}'",
                configured,
                e,
                default
            );
            Shortcut::from_str(default).expect("default accelerator must be valid")
        })
    }

    #[cfg(desktop)]
    pub fn record_shortcut(&self) -> Shortcut {
        Self::parse_or_default(&self.record, DEFAULT_RECORD_SHORTCUT)
    }

    #[cfg(desktop)]
    pub fn pause_shortcut(&self) -> Shortcut {
        Self::parse_or_default(&self.pause, DEFAULT_PAUSE_SHORTCUT)
    }

    #[cfg(desktop)]
    pub fn stop_shortcut(&self) -> Shortcut {
        Self::parse_or_default(&self.stop, DEFAULT_STOP_SHORTCUT)
    }

    /// Every shortcut the shell registers: the configurable three, the fixed
    /// function keys, and the reload accelerator. Duplicates (a user binding
    /// an action to its function key) are collapsed.
    #[cfg(desktop)]
    pub fn registration_set(&self) -> Vec<Shortcut> {
        let fixed = [
            RECORD_FUNCTION_KEY,
            PAUSE_FUNCTION_KEY,
            STOP_FUNCTION_KEY,
            RELOAD_SHORTCUT,
        ];

        let configured = [
            self.record_shortcut(),
            self.pause_shortcut(),
            self.stop_shortcut(),
        ];

        let mut shortcuts: Vec<Shortcut> = Vec::new();
        for shortcut in configured {
            if !shortcuts.contains(&shortcut) {
                shortcuts.push(shortcut);
            }
        }
        for accel in fixed {
            if let Ok(shortcut) = Shortcut::from_str(accel) {
                if !shortcuts.contains(&shortcut) {
                    shortcuts.push(shortcut);
                }
            }
        }
        shortcuts
    }

    /// Map a fired shortcut back to its logical action.
    #[cfg(desktop)]
    pub fn classify(&self, shortcut: &Shortcut) -> Option<ShortcutAction> {
        let matches = |accel: &str| Shortcut::from_str(accel).map_or(false, |s| s == *shortcut);

        if matches(RELOAD_SHORTCUT) {
            return Some(ShortcutAction::Reload);
        }
        if *shortcut == self.record_shortcut() || matches(RECORD_FUNCTION_KEY) {
            return Some(ShortcutAction::Record);
        }
        if *shortcut == self.pause_shortcut() || matches(PAUSE_FUNCTION_KEY) {
            return Some(ShortcutAction::Pause);
        }
        if *shortcut == self.stop_shortcut() || matches(STOP_FUNCTION_KEY) {
            return Some(ShortcutAction::Stop);
        }
        None
    }
}
