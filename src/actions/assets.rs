//! Bundled sound assets.
//!
//! The buzzer plays a sound as a fixed sequence of loudness steps.
//! Assets are looked up by logical name; an unknown name is a
//! recoverable configuration error, never a crash.

/// Logical name of the default alarm sound.
pub const ALARM_ASSET: &str = "alarm";

/// One step of a sound: buzzer duty for a duration.  Duty 0 is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneStep {
    pub duty_percent: u8,
    pub duration_ms: u32,
}

const fn step(duty_percent: u8, duration_ms: u32) -> ToneStep {
    ToneStep {
        duty_percent,
        duration_ms,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SoundAsset {
    pub name: &'static str,
    pub steps: &'static [ToneStep],
}

impl SoundAsset {
    /// Total playback time.
    pub fn duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.duration_ms)).sum()
    }

    /// The step playing `elapsed_ms` into playback, `None` once finished.
    pub fn step_at(&self, elapsed_ms: u64) -> Option<&ToneStep> {
        let mut start = 0u64;
        for s in self.steps {
            let end = start + u64::from(s.duration_ms);
            if elapsed_ms < end {
                return Some(s);
            }
            start = end;
        }
        None
    }
}

/// Siren: alternating loud bursts, about three seconds.
static ALARM_STEPS: [ToneStep; 12] = [
    step(100, 250),
    step(0, 50),
    step(60, 250),
    step(0, 50),
    step(100, 250),
    step(0, 50),
    step(60, 250),
    step(0, 50),
    step(100, 600),
    step(0, 100),
    step(100, 600),
    step(0, 500),
];

static ASSETS: [SoundAsset; 1] = [SoundAsset {
    name: ALARM_ASSET,
    steps: &ALARM_STEPS,
}];

/// Resolve an asset by logical name.
pub fn find(name: &str) -> Option<&'static SoundAsset> {
    ASSETS.iter().find(|a| a.name == name)
}
