//! Motor actuator trait
//!
//! The seam between the control loop and the power stage. The control
//! loop produces a signed velocity-equivalent command every period; the
//! actuator turns it into a PWM duty and H-bridge input levels.

use crate::config::{CurrentLimit, Direction};

/// Actuator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorState {
    /// Accepting commands, output off
    #[default]
    Idle,
    /// Accepting commands, output on
    Driving,
    /// Duty ramping down to zero
    SoftStopping,
    /// Soft stop finished; latched until released
    Stopped,
    /// Emergency stop; latched until released
    EmergencyStopped,
}

impl ActuatorState {
    /// Check if `set_move` commands are applied in this state
    pub fn accepts_commands(&self) -> bool {
        matches!(self, ActuatorState::Idle | ActuatorState::Driving)
    }

    /// Check if a stop is latched or in progress
    pub fn is_stopping(&self) -> bool {
        !self.accepts_commands()
    }
}

/// DC motor power stage with direction, PWM and current limit
///
/// All setters only touch this motor's output registers and are
/// idempotent: repeating a call leaves the outputs unchanged.
pub trait MotorActuator {
    /// Drive with a signed velocity-equivalent command
    ///
    /// `i16::MAX` is full duty in the motor's positive sense, `-i16::MAX`
    /// full duty in reverse, 0 is off. The configured default direction is
    /// applied so positive commands give the same physical rotation on
    /// every motor. Ignored while a stop is in progress or latched.
    fn set_move(&mut self, command: i16);

    /// Set the raw compare value, clamped to `[0, max_duty()]`
    ///
    /// Keeps the current direction. An idle bridge is switched to the
    /// motor's positive sense so a non-zero duty always moves the motor.
    /// Used by calibration paths.
    fn set_pwm(&mut self, duty: u16);

    /// Ramp the duty down to zero over a bounded number of periods
    fn soft_stop(&mut self);

    /// Zero the duty and drive both H-bridge inputs low immediately
    ///
    /// Overrides a soft stop in progress.
    fn emg_stop(&mut self);

    /// Leave a latched stop and accept commands again
    fn release(&mut self);

    /// Select the driver current-limit mode
    fn set_current_limit(&mut self, mode: CurrentLimit);

    /// Currently selected current-limit mode
    fn current_limit(&self) -> CurrentLimit;

    /// Advance time-based behaviour by one control period
    fn update(&mut self);

    /// Current actuator state
    fn state(&self) -> ActuatorState;

    /// Current compare value
    fn duty(&self) -> u16;

    /// Compare value for 100% duty (PWM timer overflow value)
    fn max_duty(&self) -> u16;

    /// Rotation produced by a positive command
    fn default_dir(&self) -> Direction;

    /// Check if `set_move` commands are currently applied
    fn accepts_commands(&self) -> bool {
        self.state().accepts_commands()
    }
}
