use serde::{Deserialize, Serialize};

/// Recording state of the hosted web app as confirmed by the page script.
///
/// The shell never infers this on its own: it only advances when the page
/// reports that the corresponding control was actually clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Stopped,
    Recording,
    Paused,
}

impl RecordingState {
    pub fn can_record(self) -> bool {
        matches!(self, Self::Stopped | Self::Paused)
    }

    pub fn can_pause(self) -> bool {
        self == Self::Recording
    }

    pub fn can_stop(self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Recording => "Recording",
            Self::Paused => "Paused",
        }
    }
}

/// Action dispatched to the page, pending a `{success}` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    Record,
    Pause,
    Stop,
}

impl PendingAction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "record" => Some(Self::Record),
            "pause" => Some(Self::Pause),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Pause => "pause",
            Self::Stop => "stop",
        }
    }
}

/// The state the machine would move to if `action` succeeds, or `None` when
/// the transition is not legal from `state`.
pub fn next_state(state: RecordingState, action: PendingAction) -> Option<RecordingState> {
    match (state, action) {
        (s, PendingAction::Record) if s.can_record() => Some(RecordingState::Recording),
        (s, PendingAction::Pause) if s.can_pause() => Some(RecordingState::Paused),
        (s, PendingAction::Stop) if s.can_stop() => Some(RecordingState::Stopped),
        _ => None,
    }
}

/// Apply a page-reported action result. Returns the new state when the result
/// was a confirmed success for a legal transition, `None` otherwise (the state
/// is left unchanged either way; the caller decides how to surface failures).
pub fn apply_result(
    state: RecordingState,
    action: PendingAction,
    success: bool,
) -> Option<RecordingState> {
    if !success {
        return None;
    }
    next_state(state, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_advances_through_all_states() {
        let s = RecordingState::Stopped;
        let s = apply_result(s, PendingAction::Record, true).unwrap();
        assert_eq!(s, RecordingState::Recording);
        let s = apply_result(s, PendingAction::Pause, true).unwrap();
        assert_eq!(s, RecordingState::Paused);
        let s = apply_result(s, PendingAction::Record, true).unwrap();
        assert_eq!(s, RecordingState::Recording);
        let s = apply_result(s, PendingAction::Stop, true).unwrap();
        assert_eq!(s, RecordingState::Stopped);
    }

    #[test]
    fn stop_is_legal_from_paused() {
        assert_eq!(
            next_state(RecordingState::Paused, PendingAction::Stop),
            Some(RecordingState::Stopped)
        );
    }

    #[test]
    fn failure_never_advances() {
        assert_eq!(
            apply_result(RecordingState::Stopped, PendingAction::Record, false),
            None
        );
        assert_eq!(
            apply_result(RecordingState::Recording, PendingAction::Stop, false),
            None
        );
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        // Pause only makes sense while recording.
        assert_eq!(next_state(RecordingState::Stopped, PendingAction::Pause), None);
        assert_eq!(next_state(RecordingState::Paused, PendingAction::Pause), None);
        // Stop from stopped is a no-op request.
        assert_eq!(next_state(RecordingState::Stopped, PendingAction::Stop), None);
        // Record while already recording is rejected rather than restarted.
        assert_eq!(
            next_state(RecordingState::Recording, PendingAction::Record),
            None
        );
    }

    #[test]
    fn action_round_trips_through_str() {
        for action in [PendingAction::Record, PendingAction::Pause, PendingAction::Stop] {
            assert_eq!(PendingAction::from_str(action.as_str()), Some(action));
        }
        assert_eq!(PendingAction::from_str("reload"), None);
    }
}
