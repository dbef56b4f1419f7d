//! Piezo buzzer driver.
//!
//! Drives a passive buzzer through any `embedded_hal::pwm::SetDutyCycle`
//! channel (LEDC on the ESP32).  Loudness is the duty cycle in percent;
//! 0 silences it.  The driver is a dumb actuator: tone sequencing lives in
//! [`AudioAlarm`](crate::actions::alarm::AudioAlarm).

use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerState {
    Silent,
    Sounding { duty: u8 },
}

pub struct BuzzerDriver<P: SetDutyCycle> {
    pwm: P,
    state: BuzzerState,
}

impl<P: SetDutyCycle> BuzzerDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            state: BuzzerState::Silent,
        }
    }

    /// Sound at `duty` percent (clamped to 100).  0 is the same as [`silence`](Self::silence).
    pub fn set(&mut self, duty: u8) -> Result<(), ActionError> {
        let duty = duty.min(100);
        if duty == 0 {
            return self.silence();
        }
        self.pwm
            .set_duty_cycle_percent(duty)
            .map_err(|_| ActionError::DriverFault)?;
        self.state = BuzzerState::Sounding { duty };
        Ok(())
    }

    pub fn silence(&mut self) -> Result<(), ActionError> {
        self.state = BuzzerState::Silent;
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActionError::DriverFault)
    }

    pub fn state(&self) -> BuzzerState {
        self.state
    }

    pub fn is_sounding(&self) -> bool {
        !matches!(self.state, BuzzerState::Silent)
    }
}
