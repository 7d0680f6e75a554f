//! H-bridge DC motor driver
//!
//! This driver provides:
//! - Signed velocity commands mapped onto PWM duty and direction inputs
//! - Per-motor polarity so a positive command turns every wheel the same way
//! - Soft stop (linear duty ramp) and latched emergency stop
//! - Current-limit selection through the driver's ILIM input
//!
//! # Outputs
//!
//! | drive   | IN_A | IN_B | PWM        |
//! |---------|------|------|------------|
//! | forward | high | low  | duty       |
//! | reverse | low  | high | duty       |
//! | off     | low  | low  | 0          |
//!
//! # Usage
//!
//! The owning control loop calls `set_move()` with the PID command and
//! `update()` once per control period to advance a soft stop.
//!
//! ```ignore
//! let mut motor = HBridgeMotor::new(pwm, in_a, in_b, ilim, HBridgeConfig::default());
//! motor.set_move(i16::MAX / 2); // half duty, forward
//!
//! motor.soft_stop();
//! for _ in 0..30 {
//!     motor.update();
//! }
//! ```

use quadrive_core::config::{
    CurrentLimit, Direction, MotorConfig, MAX_CURRENT, REDUCED_CURRENT, SOFT_STOP_PERIODS,
};
use quadrive_core::traits::{ActuatorState, MotorActuator};
use quadrive_hal::{OutputPin, PwmChannel};

/// H-bridge driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HBridgeConfig {
    /// Rotation produced by a positive command
    pub default_dir: Direction,
    /// Current limit applied at construction
    pub current_limit: CurrentLimit,
    /// Control periods a soft stop takes (0 = instant)
    pub soft_stop_periods: u16,
}

impl Default for HBridgeConfig {
    fn default() -> Self {
        Self {
            default_dir: Direction::Clockwise,
            current_limit: CurrentLimit::Full,
            soft_stop_periods: SOFT_STOP_PERIODS,
        }
    }
}

impl From<&MotorConfig> for HBridgeConfig {
    fn from(config: &MotorConfig) -> Self {
        Self {
            default_dir: config.default_dir,
            current_limit: config.current_limit,
            soft_stop_periods: config.soft_stop_periods,
        }
    }
}

/// Bridge input configuration currently applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drive {
    Off,
    Forward,
    Reverse,
}

/// H-bridge DC motor driver
///
/// Owns the PWM channel, both bridge inputs and the ILIM line of one motor.
pub struct HBridgeMotor<P, A, B, I> {
    pwm: P,
    in_a: A,
    in_b: B,
    ilim: I,
    config: HBridgeConfig,
    state: ActuatorState,
    drive: Drive,
    /// Duty when the soft stop started
    stop_start_duty: u16,
    /// Periods elapsed in the soft stop
    stop_elapsed: u16,
}

impl<P, A, B, I> HBridgeMotor<P, A, B, I>
where
    P: PwmChannel,
    A: OutputPin,
    B: OutputPin,
    I: OutputPin,
{
    /// Create a driver with all outputs off
    pub fn new(pwm: P, in_a: A, in_b: B, ilim: I, config: HBridgeConfig) -> Self {
        let mut motor = Self {
            pwm,
            in_a,
            in_b,
            ilim,
            config,
            state: ActuatorState::Idle,
            drive: Drive::Off,
            stop_start_duty: 0,
            stop_elapsed: 0,
        };
        motor.outputs_off();
        motor.apply_current_limit(config.current_limit);
        motor
    }

    /// Get the configuration
    pub fn config(&self) -> &HBridgeConfig {
        &self.config
    }

    /// Get access to the PWM channel
    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    /// Get the bridge input levels `(IN_A, IN_B)`
    pub fn inputs(&self) -> (bool, bool) {
        (self.in_a.is_set_high(), self.in_b.is_set_high())
    }

    /// Get access to the ILIM pin
    pub fn ilim(&self) -> &I {
        &self.ilim
    }

    /// Scale a command magnitude onto `[0, max_duty]`
    fn scale_duty(&self, command: i16) -> u16 {
        let max = self.pwm.max_duty() as u32;
        let magnitude = (command.unsigned_abs() as u32).min(i16::MAX as u32);
        (magnitude * max / i16::MAX as u32) as u16
    }

    fn set_drive(&mut self, drive: Drive) {
        if self.drive == drive {
            return;
        }
        match drive {
            Drive::Forward => {
                self.in_b.set_low();
                self.in_a.set_high();
            }
            Drive::Reverse => {
                self.in_a.set_low();
                self.in_b.set_high();
            }
            Drive::Off => {
                self.in_a.set_low();
                self.in_b.set_low();
            }
        }
        self.drive = drive;
    }

    fn outputs_off(&mut self) {
        self.pwm.set_duty(0);
        self.in_a.set_low();
        self.in_b.set_low();
        self.drive = Drive::Off;
    }

    fn apply_current_limit(&mut self, mode: CurrentLimit) {
        self.ilim.set_state(mode.ilim_level() == MAX_CURRENT);
    }

    /// Bridge inputs for a command of the given sign
    fn drive_for(&self, sign: i8) -> Drive {
        if sign * self.config.default_dir.sign() > 0 {
            Drive::Forward
        } else {
            Drive::Reverse
        }
    }

    /// Duty for the current soft-stop progress
    fn soft_stop_duty(&self) -> u16 {
        let total = self.config.soft_stop_periods as u32;
        let remaining = total.saturating_sub(self.stop_elapsed as u32);
        (self.stop_start_duty as u32 * remaining / total) as u16
    }

    fn finish_stop(&mut self, state: ActuatorState) {
        self.outputs_off();
        self.state = state;
    }
}

impl<P, A, B, I> MotorActuator for HBridgeMotor<P, A, B, I>
where
    P: PwmChannel,
    A: OutputPin,
    B: OutputPin,
    I: OutputPin,
{
    fn set_move(&mut self, command: i16) {
        if !self.state.accepts_commands() {
            return;
        }

        let duty = self.scale_duty(command);
        if duty == 0 {
            self.pwm.set_duty(0);
            self.set_drive(Drive::Off);
            self.state = ActuatorState::Idle;
            return;
        }

        let sign: i8 = if command > 0 { 1 } else { -1 };
        let drive = self.drive_for(sign);

        // Never drive the new direction at the old duty
        if drive != self.drive {
            self.pwm.set_duty(0);
        }
        self.set_drive(drive);
        self.pwm.set_duty(duty);
        self.state = ActuatorState::Driving;
    }

    fn set_pwm(&mut self, duty: u16) {
        if !self.state.accepts_commands() {
            return;
        }
        let duty = duty.min(self.pwm.max_duty());
        if duty > 0 && self.drive == Drive::Off {
            let drive = self.drive_for(1);
            self.set_drive(drive);
        }
        self.pwm.set_duty(duty);
        self.state = if duty == 0 {
            ActuatorState::Idle
        } else {
            ActuatorState::Driving
        };
    }

    fn soft_stop(&mut self) {
        match self.state {
            ActuatorState::SoftStopping
            | ActuatorState::Stopped
            | ActuatorState::EmergencyStopped => {}
            ActuatorState::Idle | ActuatorState::Driving => {
                let duty = self.pwm.duty();
                if duty == 0 || self.config.soft_stop_periods == 0 {
                    self.finish_stop(ActuatorState::Stopped);
                } else {
                    self.stop_start_duty = duty;
                    self.stop_elapsed = 0;
                    self.state = ActuatorState::SoftStopping;
                }
            }
        }
    }

    fn emg_stop(&mut self) {
        self.finish_stop(ActuatorState::EmergencyStopped);
    }

    fn release(&mut self) {
        if self.state.is_stopping() {
            self.finish_stop(ActuatorState::Idle);
        }
    }

    fn set_current_limit(&mut self, mode: CurrentLimit) {
        self.apply_current_limit(mode);
    }

    fn current_limit(&self) -> CurrentLimit {
        CurrentLimit::from_level(if self.ilim.is_set_high() {
            MAX_CURRENT
        } else {
            REDUCED_CURRENT
        })
    }

    fn update(&mut self) {
        if self.state != ActuatorState::SoftStopping {
            return;
        }

        self.stop_elapsed = self.stop_elapsed.saturating_add(1);
        if self.stop_elapsed >= self.config.soft_stop_periods {
            self.finish_stop(ActuatorState::Stopped);
        } else {
            let duty = self.soft_stop_duty();
            self.pwm.set_duty(duty);
        }
    }

    fn state(&self) -> ActuatorState {
        self.state
    }

    fn duty(&self) -> u16 {
        self.pwm.duty()
    }

    fn max_duty(&self) -> u16 {
        self.pwm.max_duty()
    }

    fn default_dir(&self) -> Direction {
        self.config.default_dir
    }
}
