use tauri::{AppHandle, State};

use crate::buttons::{ButtonCandidate, ButtonKind, ButtonLocator};
use crate::recording::{self, PendingAction, RecordingState};
use crate::state::AppState;

/// Page-side entry point of the control heuristics: the script harvests every
/// button-like element and asks which one to click. Returns the candidate's
/// page index, or `None` when nothing matches (the page then reports failure).
#[tauri::command]
pub fn locate_button(
    action: String,
    candidates: Vec<ButtonCandidate>,
    locator: State<'_, ButtonLocator>,
    state: State<'_, AppState>,
) -> Result<Option<usize>, String> {
    let kind =
        ButtonKind::from_str(&action).ok_or_else(|| format!("unknown action '{}'", action))?;

    let found = locator.find(kind, &candidates);
    match found {
        Some(index) => {
            log::debug!(
                "located {} control at index {} ({} candidates)",
                action,
                index,
                candidates.len()
            );
            // The click result arrives later through page_action_result.
            if let Some(pending) = PendingAction::from_str(&action) {
                state.set_pending_action(pending);
            }
        }
        None => {
            log::warn!(
                "no {} control found among {} candidates",
                action,
                candidates.len()
            );
        }
    }
    Ok(found)
}

/// Page-reported outcome of a dispatched action. The state machine advances
/// only on a confirmed success for an action the host actually dispatched;
/// unsolicited results are dropped, and failures leave the state untouched
/// and are surfaced on the banner.
#[tauri::command]
pub fn page_action_result(
    app: AppHandle,
    action: String,
    success: bool,
    error: Option<String>,
    state: State<'_, AppState>,
) -> Result<(), String> {
    let action =
        PendingAction::from_str(&action).ok_or_else(|| format!("unknown action '{}'", action))?;

    if !state.take_pending_action(action) {
        log::warn!("ignoring unsolicited {} result", action.as_str());
        return Ok(());
    }

    let current = state.recording_state();
    match recording::apply_result(current, action, success) {
        Some(next) => {
            *state.recording.lock().unwrap() = next;
            log::info!("recording state: {} -> {}", current.label(), next.label());
            crate::refresh_recording_ui(&app, next);
        }
        None => {
            let reason = if success {
                format!("{} is not valid while {}", action.as_str(), current.label())
            } else {
                error.unwrap_or_else(|| "page reported failure".to_string())
            };
            log::warn!(
                "{} did not advance from {}: {}",
                action.as_str(),
                current.label(),
                reason
            );
            crate::page::banner_notice(&app, &format!("{} failed: {}", action.as_str(), reason));
            crate::emit_system_event(
                &app,
                "error",
                &format!("{} did not complete", action.as_str()),
                Some(&reason),
            );
        }
    }
    Ok(())
}

#[tauri::command]
pub fn get_recording_state(state: State<'_, AppState>) -> RecordingState {
    state.recording_state()
}
