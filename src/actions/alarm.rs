//! Audible alarm action.
//!
//! Plays a bundled [`SoundAsset`] on the buzzer.  Playback is stepped from
//! the main loop by [`poll_action`](TriggerAction::poll_action) and
//! reports completion once the asset's duration has elapsed.

use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use crate::actions::assets::{self, SoundAsset};
use crate::app::ports::{ActionPoll, ActionProgress, TriggerAction};
use crate::drivers::buzzer::BuzzerDriver;
use crate::error::ActionError;

struct Playback {
    asset: &'static SoundAsset,
    started_ms: u64,
    duty: u8,
}

pub struct AudioAlarm<P: SetDutyCycle> {
    buzzer: BuzzerDriver<P>,
    asset_name: heapless::String<16>,
    playback: Option<Playback>,
}

impl<P: SetDutyCycle> AudioAlarm<P> {
    pub fn new(buzzer: BuzzerDriver<P>, asset_name: &str) -> Self {
        let mut name = heapless::String::new();
        if name.push_str(asset_name).is_err() {
            warn!("AudioAlarm: asset name '{}' too long", asset_name);
        }
        Self {
            buzzer,
            asset_name: name,
            playback: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn buzzer(&self) -> &BuzzerDriver<P> {
        &self.buzzer
    }

    fn silence(&mut self) {
        if let Err(e) = self.buzzer.silence() {
            warn!("AudioAlarm: buzzer silence failed: {}", e);
        }
    }
}

impl<P: SetDutyCycle> TriggerAction for AudioAlarm<P> {
    fn fire(&mut self, now_ms: u64) -> Result<ActionProgress, ActionError> {
        let Some(asset) = assets::find(&self.asset_name) else {
            warn!("AudioAlarm: sound asset '{}' not found", self.asset_name);
            return Err(ActionError::ResourceMissing);
        };

        let duty = asset.step_at(0).map_or(0, |s| s.duty_percent);
        if let Err(e) = self.buzzer.set(duty) {
            self.playback = None;
            return Err(e);
        }
        self.playback = Some(Playback {
            asset,
            started_ms: now_ms,
            duty,
        });
        info!(
            "AudioAlarm: playing '{}' ({} ms)",
            asset.name,
            asset.duration_ms()
        );
        Ok(ActionProgress::Running)
    }

    fn poll_action(&mut self, now_ms: u64) -> ActionPoll {
        let Some(playback) = self.playback.as_mut() else {
            return ActionPoll::Idle;
        };

        let asset = playback.asset;
        let elapsed = now_ms.saturating_sub(playback.started_ms);
        match asset.step_at(elapsed) {
            Some(step) => {
                if step.duty_percent != playback.duty {
                    playback.duty = step.duty_percent;
                    if let Err(e) = self.buzzer.set(step.duty_percent) {
                        warn!("AudioAlarm: buzzer write failed: {}", e);
                    }
                }
                ActionPoll::Running
            }
            None => {
                self.playback = None;
                self.silence();
                info!("AudioAlarm: playback finished");
                ActionPoll::Completed
            }
        }
    }

    fn cancel(&mut self) {
        if self.playback.take().is_some() {
            info!("AudioAlarm: stopped");
        }
        self.silence();
    }
}
