use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Display name reported when no probe backend can identify the device.
pub const PLACEHOLDER_SOURCE_NAME: &str = "System Audio Input";

/// Last known display name and volume fraction of the OS default input device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioDeviceState {
    pub name: String,
    /// Volume fraction, always within [0, 1].
    pub level: f32,
}

impl AudioDeviceState {
    pub fn new(name: impl Into<String>, level: f32) -> Self {
        Self {
            name: name.into(),
            level: if level.is_finite() {
                level.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_SOURCE_NAME, 0.0)
    }
}

/// Mute flag of the default input device, derived on demand and never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuteStatus {
    pub is_muted: bool,
    pub source_name: String,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}")]
    CommandFailed { tool: &'static str, status: String },
    #[error("no default input source could be determined")]
    NoDefaultSource,
    #[error("audio control is not supported on this platform")]
    Unsupported,
}

/// Narrow interface over "what is the current default input device, and is it
/// muted?". Every OS interaction behind it is a best-effort text scrape of a
/// command-line tool, so implementations degrade to placeholder values rather
/// than failing queries; only the explicit mute toggle surfaces errors.
pub trait AudioDeviceProbe: Send + Sync {
    /// Never fails: on any command or parse error the placeholder
    /// `{ name: "System Audio Input", level: 0 }` is returned.
    fn current_device(&self) -> AudioDeviceState;

    /// `is_muted: false` on any failure. That can mask a genuinely muted
    /// microphone, so failures are logged at warn level.
    fn mute_status(&self) -> MuteStatus;

    /// Toggle the default source's mute flag, then re-query to confirm.
    fn toggle_mute(&self) -> Result<MuteStatus, ProbeError>;
}

/// The probe for the platform we are running on.
pub fn default_probe() -> Arc<dyn AudioDeviceProbe> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(linux::PulseAudioProbe::new())
    }
    #[cfg(target_os = "macos")]
    {
        Arc::new(macos::OsaScriptProbe)
    }
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows_impl::WasapiProbe)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Arc::new(NullProbe)
    }
}

/// Fallback for platforms without any audio-control tooling.
pub struct NullProbe;

impl AudioDeviceProbe for NullProbe {
    fn current_device(&self) -> AudioDeviceState {
        AudioDeviceState::placeholder()
    }

    fn mute_status(&self) -> MuteStatus {
        MuteStatus {
            is_muted: false,
            source_name: PLACEHOLDER_SOURCE_NAME.to_string(),
        }
    }

    fn toggle_mute(&self) -> Result<MuteStatus, ProbeError> {
        Err(ProbeError::Unsupported)
    }
}

// ============================================================================
// Text parsing helpers (shared across backends, unit-tested)
// ============================================================================

// Compiled once; these run on every poll tick.
static PERCENT_RE: OnceLock<Regex> = OnceLock::new();
static WPCTL_VOLUME_RE: OnceLock<Regex> = OnceLock::new();
static ARECORD_CARD_RE: OnceLock<Regex> = OnceLock::new();

/// Extract the first percentage value from tool output and convert it to a
/// [0, 1] fraction. Malformed or absent percentages yield `None`; values above
/// 100% (PulseAudio over-amplification) are clamped.
pub(crate) fn parse_volume_percent(output: &str) -> Option<f32> {
    let re = PERCENT_RE.get_or_init(|| Regex::new(r"(\d+)%").expect("hardcoded pattern"));
    let caps = re.captures(output)?;
    let pct: f32 = caps.get(1)?.as_str().parse().ok()?;
    Some((pct / 100.0).clamp(0.0, 1.0))
}

/// Parse `wpctl get-volume` output, e.g. `Volume: 0.40 [MUTED]`.
pub(crate) fn parse_wpctl_volume(output: &str) -> Option<(f32, bool)> {
    let re = WPCTL_VOLUME_RE
        .get_or_init(|| Regex::new(r"Volume:\s*([0-9]*\.?[0-9]+)").expect("hardcoded pattern"));
    let caps = re.captures(output)?;
    let vol: f32 = caps.get(1)?.as_str().parse().ok()?;
    Some((vol.clamp(0.0, 1.0), output.contains("[MUTED]")))
}

/// Parse the `Description:` field out of a `pactl list sources` block for the
/// named source. Falls back to `None` when the source or field is missing.
pub(crate) fn parse_source_description(listing: &str, source_name: &str) -> Option<String> {
    let mut in_block = false;
    for line in listing.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix("Name: ") {
            in_block = name.trim() == source_name;
            continue;
        }
        if in_block {
            if let Some(desc) = trimmed.strip_prefix("Description: ") {
                let desc = desc.trim();
                if !desc.is_empty() {
                    return Some(desc.to_string());
                }
                return None;
            }
        }
    }
    None
}

/// Parse `Mute: yes` / `Mute: no` from `pactl get-source-mute` output.
pub(crate) fn parse_mute_flag(output: &str) -> Option<bool> {
    let lower = output.to_lowercase();
    if lower.contains("mute: yes") {
        Some(true)
    } else if lower.contains("mute: no") {
        Some(false)
    } else {
        None
    }
}

/// Pick the first plausible capture source from `pactl list sources short`
/// output (tab-separated `index\tname\t…`). Monitor sources mirror playback
/// streams and are skipped.
pub(crate) fn parse_first_input_source(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .map(str::trim)
        .find(|name| !name.is_empty() && !name.ends_with(".monitor"))
        .map(str::to_string)
}

/// Last-resort device enumeration: parse the first capture device description
/// out of `arecord -l` output, e.g.
/// `card 1: PCH [HDA Intel PCH], device 0: ALC295 Analog [ALC295 Analog]`.
pub(crate) fn parse_arecord_device(listing: &str) -> Option<String> {
    let re = ARECORD_CARD_RE
        .get_or_init(|| Regex::new(r"card \d+: \S+ \[([^\]]+)\]").expect("hardcoded pattern"));
    let caps = re.captures(listing)?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

// ============================================================================
// Linux: pactl primary, wpctl fallback, arecord as last resort
// ============================================================================

#[cfg(target_os = "linux")]
pub(crate) mod linux {
    use super::*;
    use std::process::Command;

    pub struct PulseAudioProbe;

    impl PulseAudioProbe {
        pub fn new() -> Self {
            Self
        }

        fn run(tool: &'static str, args: &[&str]) -> Result<String, ProbeError> {
            let output = Command::new(tool)
                .args(args)
                .output()
                .map_err(|source| ProbeError::Spawn { tool, source })?;
            if !output.status.success() {
                return Err(ProbeError::CommandFailed {
                    tool,
                    status: output.status.to_string(),
                });
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }

        /// Internal name of the default source, via the fallback chain:
        /// `pactl get-default-source`, then the first non-monitor entry of
        /// `pactl list sources short`.
        fn default_source_name(&self) -> Result<String, ProbeError> {
            if let Ok(out) = Self::run("pactl", &["get-default-source"]) {
                let name = out.trim();
                if !name.is_empty() {
                    return Ok(name.to_string());
                }
            }
            let listing = Self::run("pactl", &["list", "sources", "short"])?;
            parse_first_input_source(&listing).ok_or(ProbeError::NoDefaultSource)
        }

        /// Human-readable description for a source, falling back to the raw
        /// source name when `pactl list sources` gives nothing usable.
        fn display_name(&self, source_name: &str) -> String {
            match Self::run("pactl", &["list", "sources"]) {
                Ok(listing) => parse_source_description(&listing, source_name)
                    .unwrap_or_else(|| source_name.to_string()),
                Err(e) => {
                    log::debug!("pactl list sources failed: {}", e);
                    source_name.to_string()
                }
            }
        }

        fn source_level(&self, source_name: &str) -> f32 {
            if let Ok(out) = Self::run("pactl", &["get-source-volume", source_name]) {
                if let Some(level) = parse_volume_percent(&out) {
                    return level;
                }
            }
            // PipeWire-only systems may ship wpctl without the pactl shim.
            if let Ok(out) = Self::run("wpctl", &["get-volume", "@DEFAULT_AUDIO_SOURCE@"]) {
                if let Some((level, _)) = parse_wpctl_volume(&out) {
                    return level;
                }
            }
            0.0
        }
    }

    impl AudioDeviceProbe for PulseAudioProbe {
        fn current_device(&self) -> AudioDeviceState {
            match self.default_source_name() {
                Ok(source) => {
                    AudioDeviceState::new(self.display_name(&source), self.source_level(&source))
                }
                Err(e) => {
                    log::debug!("default source lookup failed ({}), trying arecord", e);
                    // Lower-level enumeration: ALSA sees capture hardware even
                    // when no sound server is running.
                    match Self::run("arecord", &["-l"]) {
                        Ok(listing) => parse_arecord_device(&listing)
                            .map(|name| AudioDeviceState::new(name, 0.0))
                            .unwrap_or_else(AudioDeviceState::placeholder),
                        Err(e) => {
                            log::debug!("arecord enumeration failed: {}", e);
                            AudioDeviceState::placeholder()
                        }
                    }
                }
            }
        }

        fn mute_status(&self) -> MuteStatus {
            let (source_name, display) = match self.default_source_name() {
                Ok(source) => {
                    let display = self.display_name(&source);
                    (source, display)
                }
                Err(e) => {
                    log::warn!("mute status unavailable (no default source): {}", e);
                    return MuteStatus {
                        is_muted: false,
                        source_name: PLACEHOLDER_SOURCE_NAME.to_string(),
                    };
                }
            };

            let is_muted = match Self::run("pactl", &["get-source-mute", &source_name]) {
                Ok(out) => match parse_mute_flag(&out) {
                    Some(flag) => flag,
                    None => {
                        log::warn!("could not parse mute flag from pactl output; reporting unmuted");
                        false
                    }
                },
                Err(e) => {
                    log::warn!("mute query failed ({}); reporting unmuted", e);
                    false
                }
            };

            MuteStatus {
                is_muted,
                source_name: display,
            }
        }

        fn toggle_mute(&self) -> Result<MuteStatus, ProbeError> {
            let source = self.default_source_name()?;
            Self::run("pactl", &["set-source-mute", &source, "toggle"])?;
            // Re-query so the caller gets the confirmed post-toggle value.
            Ok(self.mute_status())
        }
    }
}

// ============================================================================
// macOS: osascript volume scripting, system_profiler for the device name
// ============================================================================

#[cfg(target_os = "macos")]
pub(crate) mod macos {
    use super::*;
    use std::process::Command;

    pub struct OsaScriptProbe;

    impl OsaScriptProbe {
        fn osascript(script: &str) -> Result<String, ProbeError> {
            let output = Command::new("osascript")
                .args(["-e", script])
                .output()
                .map_err(|source| ProbeError::Spawn {
                    tool: "osascript",
                    source,
                })?;
            if !output.status.success() {
                return Err(ProbeError::CommandFailed {
                    tool: "osascript",
                    status: output.status.to_string(),
                });
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }

        fn input_volume(&self) -> Option<f32> {
            let out = Self::osascript("input volume of (get volume settings)").ok()?;
            let pct: f32 = out.trim().parse().ok()?;
            Some((pct / 100.0).clamp(0.0, 1.0))
        }

        /// Default input device name from `system_profiler SPAudioDataType`:
        /// the device header line preceding a `Default Input Device: Yes` row.
        fn input_device_name(&self) -> Option<String> {
            let output = Command::new("system_profiler")
                .arg("SPAudioDataType")
                .output()
                .ok()?;
            let text = String::from_utf8_lossy(&output.stdout);
            let mut current: Option<String> = None;
            for line in text.lines() {
                let trimmed = line.trim();
                if trimmed.ends_with(':') && !trimmed.contains("Devices") {
                    current = Some(trimmed.trim_end_matches(':').to_string());
                } else if trimmed.starts_with("Default Input Device: Yes") {
                    return current;
                }
            }
            None
        }
    }

    impl AudioDeviceProbe for OsaScriptProbe {
        fn current_device(&self) -> AudioDeviceState {
            let level = self.input_volume().unwrap_or(0.0);
            let name = self
                .input_device_name()
                .unwrap_or_else(|| PLACEHOLDER_SOURCE_NAME.to_string());
            AudioDeviceState::new(name, level)
        }

        fn mute_status(&self) -> MuteStatus {
            // macOS has no input-mute flag; input volume 0 is the convention.
            let is_muted = match self.input_volume() {
                Some(level) => level <= f32::EPSILON,
                None => {
                    log::warn!("input volume query failed; reporting unmuted");
                    false
                }
            };
            MuteStatus {
                is_muted,
                source_name: self
                    .input_device_name()
                    .unwrap_or_else(|| PLACEHOLDER_SOURCE_NAME.to_string()),
            }
        }

        fn toggle_mute(&self) -> Result<MuteStatus, ProbeError> {
            let level = self.input_volume().ok_or(ProbeError::NoDefaultSource)?;
            let target = if level <= f32::EPSILON { 50 } else { 0 };
            Self::osascript(&format!("set volume input volume {}", target))?;
            Ok(self.mute_status())
        }
    }
}

// ============================================================================
// Windows: WASAPI default capture endpoint
// ============================================================================

#[cfg(target_os = "windows")]
pub(crate) mod windows_impl {
    use super::*;
    use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
    use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
    use windows::Win32::Media::Audio::{
        eCapture, eConsole, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator,
    };
    use windows::Win32::System::Com::{
        CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_MULTITHREADED, STGM_READ,
    };

    pub struct WasapiProbe;

    impl WasapiProbe {
        fn default_capture_device() -> Result<IMMDevice, ProbeError> {
            unsafe {
                // Ignore the error if COM is already initialized on this thread.
                let _ = CoInitializeEx(None, COINIT_MULTITHREADED);
                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|e| {
                        ProbeError::CommandFailed {
                            tool: "wasapi",
                            status: e.to_string(),
                        }
                    })?;
                enumerator
                    .GetDefaultAudioEndpoint(eCapture, eConsole)
                    .map_err(|_| ProbeError::NoDefaultSource)
            }
        }

        fn friendly_name(device: &IMMDevice) -> Option<String> {
            unsafe {
                let store = device.OpenPropertyStore(STGM_READ).ok()?;
                let value = store.GetValue(&PKEY_Device_FriendlyName).ok()?;
                let name = value.to_string();
                if name.is_empty() {
                    None
                } else {
                    Some(name)
                }
            }
        }

        fn endpoint_volume(device: &IMMDevice) -> Result<IAudioEndpointVolume, ProbeError> {
            unsafe {
                device
                    .Activate::<IAudioEndpointVolume>(CLSCTX_ALL, None)
                    .map_err(|e| ProbeError::CommandFailed {
                        tool: "wasapi",
                        status: e.to_string(),
                    })
            }
        }
    }

    impl AudioDeviceProbe for WasapiProbe {
        fn current_device(&self) -> AudioDeviceState {
            let device = match Self::default_capture_device() {
                Ok(d) => d,
                Err(e) => {
                    log::debug!("default capture endpoint lookup failed: {}", e);
                    return AudioDeviceState::placeholder();
                }
            };
            let name = Self::friendly_name(&device)
                .unwrap_or_else(|| PLACEHOLDER_SOURCE_NAME.to_string());
            let level = Self::endpoint_volume(&device)
                .and_then(|v| unsafe {
                    v.GetMasterVolumeLevelScalar()
                        .map_err(|e| ProbeError::CommandFailed {
                            tool: "wasapi",
                            status: e.to_string(),
                        })
                })
                .unwrap_or(0.0);
            AudioDeviceState::new(name, level)
        }

        fn mute_status(&self) -> MuteStatus {
            match Self::default_capture_device() {
                Ok(device) => {
                    let source_name = Self::friendly_name(&device)
                        .unwrap_or_else(|| PLACEHOLDER_SOURCE_NAME.to_string());
                    let is_muted = Self::endpoint_volume(&device)
                        .and_then(|v| unsafe {
                            v.GetMute().map_err(|e| ProbeError::CommandFailed {
                                tool: "wasapi",
                                status: e.to_string(),
                            })
                        })
                        .map(|b| b.as_bool())
                        .unwrap_or_else(|e| {
                            log::warn!("mute query failed ({}); reporting unmuted", e);
                            false
                        });
                    MuteStatus {
                        is_muted,
                        source_name,
                    }
                }
                Err(e) => {
                    log::warn!("mute status unavailable (no capture endpoint): {}", e);
                    MuteStatus {
                        is_muted: false,
                        source_name: PLACEHOLDER_SOURCE_NAME.to_string(),
                    }
                }
            }
        }

        fn toggle_mute(&self) -> Result<MuteStatus, ProbeError> {
            let device = Self::default_capture_device()?;
            let volume = Self::endpoint_volume(&device)?;
            unsafe {
                let muted = volume.GetMute().map_err(|e| ProbeError::CommandFailed {
                    tool: "wasapi",
                    status: e.to_string(),
                })?;
                volume
                    .SetMute(!muted.as_bool(), std::ptr::null())
                    .map_err(|e| ProbeError::CommandFailed {
                        tool: "wasapi",
                        status: e.to_string(),
                    })?;
            }
            Ok(self.mute_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_percent_parses_and_clamps() {
        let out = "Volume: front-left: 19661 /  30% / -31.37 dB";
        assert_eq!(parse_volume_percent(out), Some(0.30));

        // PulseAudio allows >100% amplification; clamp to 1.0.
        assert_eq!(parse_volume_percent("Volume: 153%"), Some(1.0));
    }

    #[test]
    fn malformed_volume_yields_none() {
        assert_eq!(parse_volume_percent("Volume: front-left: n/a"), None);
        assert_eq!(parse_volume_percent(""), None);
    }

    #[test]
    fn level_is_always_clamped_in_state() {
        assert_eq!(AudioDeviceState::new("Mic", 1.7).level, 1.0);
        assert_eq!(AudioDeviceState::new("Mic", -0.2).level, 0.0);
        assert_eq!(AudioDeviceState::new("Mic", f32::NAN).level, 0.0);
    }

    #[test]
    fn wpctl_volume_parses_fraction_and_mute() {
        assert_eq!(
            parse_wpctl_volume("Volume: 0.40 [MUTED]"),
            Some((0.40, true))
        );
        assert_eq!(parse_wpctl_volume("Volume: 0.65"), Some((0.65, false)));
        assert_eq!(parse_wpctl_volume("no volume here"), None);
    }

    #[test]
    fn source_description_is_extracted_from_matching_block() {
        let listing = "\
Source #55
\tState: SUSPENDED
\tName: alsa_input.pci-0000_00_1f.3.analog-stereo
\tDescription: Built-in Audio Analog Stereo
\tMute: no
Source #56
\tName: other.source
\tDescription: Other Device
";
        assert_eq!(
            parse_source_description(listing, "alsa_input.pci-0000_00_1f.3.analog-stereo")
                .as_deref(),
            Some("Built-in Audio Analog Stereo")
        );
        assert_eq!(parse_source_description(listing, "missing.source"), None);
    }

    #[test]
    fn mute_flag_parses_both_values() {
        assert_eq!(parse_mute_flag("Mute: yes"), Some(true));
        assert_eq!(parse_mute_flag("Mute: no"), Some(false));
        assert_eq!(parse_mute_flag("garbage"), None);
    }

    #[test]
    fn first_input_source_skips_monitors() {
        let listing = "\
54\talsa_output.pci.analog-stereo.monitor\tPipeWire\ts32le 2ch 48000Hz\tIDLE
55\talsa_input.pci.analog-stereo\tPipeWire\ts32le 2ch 48000Hz\tSUSPENDED
";
        assert_eq!(
            parse_first_input_source(listing).as_deref(),
            Some("alsa_input.pci.analog-stereo")
        );
        assert_eq!(
            parse_first_input_source("54\tout.monitor\tPipeWire\t...\tIDLE"),
            None
        );
    }

    #[test]
    fn arecord_listing_yields_card_description() {
        let listing = "\
**** List of CAPTURE Hardware Devices ****
card 0: PCH [HDA Intel PCH], device 0: ALC295 Analog [ALC295 Analog]
";
        assert_eq!(
            parse_arecord_device(listing).as_deref(),
            Some("HDA Intel PCH")
        );
        assert_eq!(parse_arecord_device("nothing"), None);
    }

    #[test]
    fn null_probe_degrades_to_placeholder() {
        let probe = NullProbe;
        assert_eq!(probe.current_device(), AudioDeviceState::placeholder());
        let status = probe.mute_status();
        assert!(!status.is_muted);
        assert_eq!(status.source_name, PLACEHOLDER_SOURCE_NAME);
        assert!(probe.toggle_mute().is_err());
    }
}
