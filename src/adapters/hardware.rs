//! Hardware adapter: bridges the valve servos to the [`ActuatorPort`].
//!
//! Owns one [`ServoDriver`] per active channel, indexed by
//! [`Valve::index`].  Generic over the PWM channel so the same adapter runs
//! on LEDC hardware and on host fakes.

use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;
use log::debug;

use crate::app::ports::ActuatorPort;
use crate::config::{MAX_CHANNELS, Valve};
use crate::drivers::ServoDriver;
use crate::error::ActuatorError;

pub struct ValveHardware<P> {
    servos: Vec<ServoDriver<P>, MAX_CHANNELS>,
}

impl<P: SetDutyCycle> ValveHardware<P> {
    /// `pwms` holds one PWM channel per active valve, in wire order.
    pub fn new(pwms: impl IntoIterator<Item = P>) -> Self {
        let mut servos = Vec::new();
        for pwm in pwms.into_iter().take(MAX_CHANNELS) {
            let _ = servos.push(ServoDriver::new(pwm));
        }
        Self { servos }
    }

    pub fn servo(&self, valve: Valve) -> Option<&ServoDriver<P>> {
        self.servos.get(valve.index())
    }
}

impl<P: SetDutyCycle> ActuatorPort for ValveHardware<P> {
    fn write_position(&mut self, valve: Valve, position: i32) -> Result<(), ActuatorError> {
        let servo = self
            .servos
            .get_mut(valve.index())
            .ok_or(ActuatorError::UnknownChannel)?;
        servo.set_degrees(position).map_err(|e| {
            debug!("{} servo: {:?}", valve.label(), e);
            ActuatorError::PwmWriteFailed
        })
    }
}
