use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::audio_probe::{AudioDeviceProbe, AudioDeviceState, MuteStatus, ProbeError};

/// Minimum level change that counts as a state change. Smaller wobbles are
/// noise from the OS mixer and would spam the tray/banner.
pub const LEVEL_DELTA_THRESHOLD: f32 = 0.05;

/// Probe cadence. Each tick is one or more short subprocess invocations, so
/// the interval is kept well above the expected tick duration.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Periodic poll of the default audio-input device.
///
/// Subscribers register a callback at `start_monitoring`; a pull-based
/// `latest()` accessor is available for callers that only want the current
/// value (tray refresh, commands).
pub struct AudioPoller {
    probe: Arc<dyn AudioDeviceProbe>,
    last_emitted: Mutex<Option<AudioDeviceState>>,
    monitor: Mutex<Option<CancellationToken>>,
}

impl AudioPoller {
    pub fn new(probe: Arc<dyn AudioDeviceProbe>) -> Self {
        Self {
            probe,
            last_emitted: Mutex::new(None),
            monitor: Mutex::new(None),
        }
    }

    /// Last state handed to subscribers, if any tick has emitted yet.
    pub fn latest(&self) -> Option<AudioDeviceState> {
        self.last_emitted.lock().unwrap().clone()
    }

    /// Probe the current device without any change comparison.
    pub fn current_device(&self) -> AudioDeviceState {
        self.probe.current_device()
    }

    pub fn mute_status(&self) -> MuteStatus {
        self.probe.mute_status()
    }

    pub fn toggle_mute(&self) -> Result<MuteStatus, ProbeError> {
        self.probe.toggle_mute()
    }

    /// Run one probe and return the new state only when it differs from the
    /// previous emission: a different name, or a level delta above the
    /// threshold. Repeated identical probes return `None`.
    pub fn poll_once(&self) -> Option<AudioDeviceState> {
        let state = self.probe.current_device();
        let mut last = self.last_emitted.lock().unwrap();
        let changed = match last.as_ref() {
            None => true,
            Some(prev) => {
                prev.name != state.name
                    || (state.level - prev.level).abs() > LEVEL_DELTA_THRESHOLD
            }
        };
        if changed {
            *last = Some(state.clone());
            Some(state)
        } else {
            None
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.lock().unwrap().is_some()
    }

    /// Start the recurring probe. `on_change` fires only for actual changes.
    /// Calling while already monitoring is a no-op.
    pub fn start_monitoring(
        self: &Arc<Self>,
        interval: Duration,
        on_change: impl Fn(AudioDeviceState) + Send + Sync + 'static,
    ) {
        let mut monitor = self.monitor.lock().unwrap();
        if monitor.is_some() {
            log::debug!("audio monitoring already running");
            return;
        }

        let token = CancellationToken::new();
        *monitor = Some(token.clone());
        drop(monitor);

        let poller = Arc::clone(self);
        tauri::async_runtime::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately so the tray has data at startup.
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        log::debug!("audio monitoring stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Some(state) = poller.poll_once() {
                            log::info!(
                                "default input changed: {} ({:.0}%)",
                                state.name,
                                state.level * 100.0
                            );
                            on_change(state);
                        }
                    }
                }
            }
        });
    }

    /// Cancel the recurring probe. Safe to call when not running.
    pub fn stop_monitoring(&self) {
        if let Some(token) = self.monitor.lock().unwrap().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_probe::{MuteStatus, PLACEHOLDER_SOURCE_NAME};
    use std::collections::VecDeque;

    /// Scripted probe: plays back a queue of states, repeating the last one,
    /// and keeps an in-memory mute flag for round-trip tests.
    struct FakeProbe {
        states: Mutex<VecDeque<AudioDeviceState>>,
        last: Mutex<AudioDeviceState>,
        muted: Mutex<bool>,
    }

    impl FakeProbe {
        fn new(states: Vec<AudioDeviceState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                last: Mutex::new(AudioDeviceState::placeholder()),
                muted: Mutex::new(false),
            }
        }
    }

    impl AudioDeviceProbe for FakeProbe {
        fn current_device(&self) -> AudioDeviceState {
            let mut queue = self.states.lock().unwrap();
            if let Some(next) = queue.pop_front() {
                *self.last.lock().unwrap() = next.clone();
                next
            } else {
                self.last.lock().unwrap().clone()
            }
        }

        fn mute_status(&self) -> MuteStatus {
            MuteStatus {
                is_muted: *self.muted.lock().unwrap(),
                source_name: self.last.lock().unwrap().name.clone(),
            }
        }

        fn toggle_mute(&self) -> Result<MuteStatus, ProbeError> {
            let mut muted = self.muted.lock().unwrap();
            *muted = !*muted;
            drop(muted);
            Ok(self.mute_status())
        }
    }

    fn poller_with(states: Vec<AudioDeviceState>) -> AudioPoller {
        AudioPoller::new(Arc::new(FakeProbe::new(states)))
    }

    #[test]
    fn first_probe_always_emits() {
        let poller = poller_with(vec![AudioDeviceState::new("Mic A", 0.30)]);
        let emitted = poller.poll_once().expect("first probe should emit");
        assert_eq!(emitted.name, "Mic A");
        assert_eq!(poller.latest(), Some(emitted));
    }

    #[test]
    fn small_level_delta_does_not_emit() {
        let poller = poller_with(vec![
            AudioDeviceState::new("Mic A", 0.30),
            AudioDeviceState::new("Mic A", 0.33),
        ]);
        assert!(poller.poll_once().is_some());
        // 0.03 delta is within the threshold.
        assert!(poller.poll_once().is_none());
        // latest() still reflects the last emission, not the last probe.
        assert_eq!(poller.latest().unwrap().level, 0.30);
    }

    #[test]
    fn level_delta_above_threshold_emits_once() {
        let poller = poller_with(vec![
            AudioDeviceState::new("Mic A", 0.30),
            AudioDeviceState::new("Mic A", 0.40),
        ]);
        assert!(poller.poll_once().is_some());
        let emitted = poller.poll_once().expect("0.10 delta should emit");
        assert_eq!(emitted.level, 0.40);
        // Probe now repeats the same state: no further emissions.
        assert!(poller.poll_once().is_none());
        assert!(poller.poll_once().is_none());
    }

    #[test]
    fn name_change_emits_regardless_of_level() {
        let poller = poller_with(vec![
            AudioDeviceState::new("Mic A", 0.50),
            AudioDeviceState::new("Mic B", 0.50),
        ]);
        assert!(poller.poll_once().is_some());
        let emitted = poller.poll_once().expect("name change should emit");
        assert_eq!(emitted.name, "Mic B");
    }

    #[test]
    fn repeated_identical_probes_emit_only_once() {
        let poller = poller_with(vec![AudioDeviceState::new("Mic A", 0.30)]);
        assert!(poller.poll_once().is_some());
        for _ in 0..5 {
            assert!(poller.poll_once().is_none());
        }
    }

    #[test]
    fn toggle_mute_round_trips_through_status() {
        let poller = poller_with(vec![]);
        assert!(!poller.mute_status().is_muted);

        let toggled = poller.toggle_mute().unwrap();
        assert!(toggled.is_muted);
        assert!(poller.mute_status().is_muted);

        let toggled = poller.toggle_mute().unwrap();
        assert!(!toggled.is_muted);
        assert!(!poller.mute_status().is_muted);
    }

    #[test]
    fn start_monitoring_while_running_is_a_no_op() {
        let poller = Arc::new(poller_with(vec![]));
        poller.start_monitoring(Duration::from_secs(60), |_| {});
        assert!(poller.is_monitoring());
        let first = poller.monitor.lock().unwrap().clone().unwrap();

        poller.start_monitoring(Duration::from_secs(60), |_| {});
        assert!(poller.is_monitoring());
        let second = poller.monitor.lock().unwrap().clone().unwrap();

        // Token clones share state, so cancelling the first shows up on the
        // second only if the guard kept the original token in place.
        first.cancel();
        assert!(second.is_cancelled());

        poller.stop_monitoring();
        assert!(!poller.is_monitoring());
    }

    #[test]
    fn stop_monitoring_without_start_is_safe() {
        let poller = poller_with(vec![]);
        poller.stop_monitoring();
        assert!(!poller.is_monitoring());
    }

    #[test]
    fn fake_probe_exhausted_queue_repeats_placeholder() {
        let poller = poller_with(vec![]);
        let state = poller.current_device();
        assert_eq!(state.name, PLACEHOLDER_SOURCE_NAME);
    }
}
