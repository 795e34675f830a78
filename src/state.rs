use std::sync::Mutex;

use crate::recording::{PendingAction, RecordingState};

/// All shared mutable state of the shell, owned by Tauri's managed-state
/// container. Touched only from command handlers and spawned tasks; nothing
/// lives in module-level statics.
#[derive(Default)]
pub struct AppState {
    /// Current recording state, advanced only on page-confirmed success.
    pub recording: Mutex<RecordingState>,
    /// Action dispatched to the page that has not reported a result yet.
    pending_action: Mutex<Option<PendingAction>>,
    /// Microphone label last pushed by the page script (browser-reported).
    current_microphone: Mutex<Option<String>>,
}

impl AppState {
    pub fn recording_state(&self) -> RecordingState {
        *self.recording.lock().unwrap()
    }

    /// Record a dispatched action awaiting a page-reported result.
    pub fn set_pending_action(&self, action: PendingAction) {
        *self.pending_action.lock().unwrap() = Some(action);
    }

    /// Consume the pending action if the reported one matches it. A `false`
    /// return marks the result as unsolicited: nothing was dispatched, the
    /// result was already consumed, or the action does not match what was
    /// dispatched (a mismatch leaves the pending action in place, since the
    /// real result may still arrive).
    pub fn take_pending_action(&self, action: PendingAction) -> bool {
        let mut pending = self.pending_action.lock().unwrap();
        if *pending == Some(action) {
            *pending = None;
            true
        } else {
            false
        }
    }

    pub fn microphone_label(&self) -> Option<String> {
        self.current_microphone.lock().unwrap().clone()
    }

    pub fn set_microphone_label(&self, label: String) {
        *self.current_microphone.lock().unwrap() = Some(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_action_is_consumed_by_matching_result() {
        let state = AppState::default();
        state.set_pending_action(PendingAction::Record);
        assert!(state.take_pending_action(PendingAction::Record));
        // Consumed: a duplicate result is unsolicited.
        assert!(!state.take_pending_action(PendingAction::Record));
    }

    #[test]
    fn mismatched_result_leaves_pending_in_place() {
        let state = AppState::default();
        state.set_pending_action(PendingAction::Record);
        assert!(!state.take_pending_action(PendingAction::Stop));
        assert!(state.take_pending_action(PendingAction::Record));
    }

    #[test]
    fn result_without_dispatch_is_unsolicited() {
        let state = AppState::default();
        assert!(!state.take_pending_action(PendingAction::Stop));
    }
}
