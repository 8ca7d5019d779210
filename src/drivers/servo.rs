//! Hobby servo driver for the valve actuators.
//!
//! Maps a position in degrees (0–180) to a pulse width between
//! [`SERVO_MIN_PULSE_US`] and [`SERVO_MAX_PULSE_US`] inside a 50 Hz frame,
//! then to a duty cycle on any `embedded_hal` PWM channel.
//!
//! ## Safety contract
//!
//! This driver only clamps to the mechanical travel.  The valve's safe
//! range is enforced one layer up by
//! [`ValveChannel`](crate::control::ValveChannel).

use embedded_hal::pwm::SetDutyCycle;

use crate::pins::{SERVO_MAX_DEGREES, SERVO_MAX_PULSE_US, SERVO_MIN_PULSE_US, SERVO_PERIOD_US};

/// Pulse width for `degrees`, clamped to the servo's travel.
pub fn pulse_width_us(degrees: i32) -> u32 {
    let degrees = degrees.clamp(0, SERVO_MAX_DEGREES) as u32;
    let span = SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US;
    SERVO_MIN_PULSE_US + span * degrees / SERVO_MAX_DEGREES as u32
}

pub struct ServoDriver<P> {
    pwm: P,
    degrees: Option<i32>,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, degrees: None }
    }

    /// Move to `degrees`.  Every call re-drives the PWM duty.
    pub fn set_degrees(&mut self, degrees: i32) -> Result<(), P::Error> {
        let degrees = degrees.clamp(0, SERVO_MAX_DEGREES);
        let pulse = pulse_width_us(degrees);
        // pulse <= SERVO_MAX_PULSE_US < SERVO_PERIOD_US, fits in u16
        self.pwm
            .set_duty_cycle_fraction(pulse as u16, SERVO_PERIOD_US as u16)?;
        self.degrees = Some(degrees);
        Ok(())
    }

    /// Last position successfully written, `None` before the first write.
    pub fn degrees(&self) -> Option<i32> {
        self.degrees
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}
