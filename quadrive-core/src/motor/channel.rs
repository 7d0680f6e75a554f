//! Per-motor control pipeline
//!
//! A [`MotorChannel`] owns everything that belongs to one motor: the
//! encoder tracker, the velocity estimator, the PID controller and the
//! actuator. It borrows the two things it shares with the rest of the
//! firmware: the [`Timebase`] and its [`MotorLink`].
//!
//! Each control period [`handler`](MotorChannel::handler) runs:
//!
//! 1. drain stop requests, gains and setpoints from the link
//! 2. sample the encoder and update the velocity estimate
//! 3. advance the actuator (soft-stop ramp)
//! 4. run the PID on the measured velocity and forward the command
//! 5. publish a status snapshot

use quadrive_hal::{FreeRunningCounter, QuadratureCounter};

use crate::config::{ConfigError, CurrentLimit, MotorConfig, PidGains};
use crate::control::{output_to_command, MotorLink, PidController, StopRequest};
use crate::encoder::EncoderTracker;
use crate::motion::VelocityEstimator;
use crate::timebase::Timebase;
use crate::traits::MotorActuator;

use super::status::MotorStatus;

/// One motor's control pipeline
pub struct MotorChannel<'a, Q, C, A> {
    name: &'static str,
    timebase: &'a Timebase<C>,
    link: &'a MotorLink,
    encoder: EncoderTracker<Q>,
    estimator: VelocityEstimator,
    pid: PidController,
    actuator: A,
    /// Last command forwarded to the actuator
    command: i16,
    /// Link setpoint generation already applied
    seen_generation: u32,
    periods: u32,
}

impl<'a, Q, C, A> MotorChannel<'a, Q, C, A>
where
    Q: QuadratureCounter,
    C: FreeRunningCounter,
    A: MotorActuator,
{
    /// Assemble a channel
    ///
    /// Centres the encoder counter, starts the estimator at the current
    /// time and applies the configured current limit. The motor stays off
    /// until the first setpoint arrives.
    pub fn new(
        name: &'static str,
        config: MotorConfig,
        counter: Q,
        mut actuator: A,
        timebase: &'a Timebase<C>,
        link: &'a MotorLink,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let encoder = EncoderTracker::new(counter, config.encoder);
        let estimator =
            VelocityEstimator::new(config.estimator, encoder.cumulative(), timebase.now());
        let pid = PidController::new(config.pid)?;
        actuator.set_current_limit(config.current_limit);

        Ok(Self {
            name,
            timebase,
            link,
            encoder,
            estimator,
            pid,
            actuator,
            command: 0,
            seen_generation: 0,
            periods: 0,
        })
    }

    /// Run one control period
    pub fn handler(&mut self) -> MotorStatus {
        self.poll_link();
        self.velocity_update();
        self.actuator.update();

        if self.actuator.accepts_commands() {
            let output = self.pid.handler(self.estimator.velocity());
            self.command = output_to_command(output, self.pid.config().output_limit);
            self.actuator.set_move(self.command);
        } else {
            self.pid.hold();
            self.command = 0;
        }

        self.periods = self.periods.wrapping_add(1);
        let status = self.status();
        self.link.publish(status);
        status
    }

    /// Sample the encoder and refresh the velocity and position estimates
    ///
    /// Returns the new velocity in rad/s.
    pub fn velocity_update(&mut self) -> f64 {
        let ticks = self.encoder.update();
        self.estimator.update(ticks, self.timebase)
    }

    fn poll_link(&mut self) {
        match self.link.take_request() {
            Some(StopRequest::Emergency) => self.emg_stop(),
            Some(StopRequest::Soft) => self.soft_stop(),
            Some(StopRequest::Release) => self.release(),
            None => {}
        }

        if let Some(gains) = self.link.take_gains() {
            if let Err(_e) = self.set_gains(gains) {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: rejected gains: {:?}", self.name, _e);
            }
        }

        if let Some(setpoint) = self.link.take_setpoint(&mut self.seen_generation) {
            self.pid.set_setpoint(setpoint);
        }
    }

    /// Set the target velocity directly (rad/s)
    pub fn set_setpoint(&mut self, velocity: f64) {
        self.pid.set_setpoint(velocity);
    }

    pub fn set_gains(&mut self, gains: PidGains) -> Result<(), ConfigError> {
        self.pid.set_gains(gains)?;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "{}: gains kp={} ki={} kd={}",
            self.name,
            gains.kp,
            gains.ki,
            gains.kd
        );
        Ok(())
    }

    /// Ramp the motor down and latch it stopped
    pub fn soft_stop(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("{}: soft stop", self.name);
        self.actuator.soft_stop();
    }

    /// Cut the motor output immediately and latch it stopped
    pub fn emg_stop(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::warn!("{}: emergency stop", self.name);
        self.actuator.emg_stop();
        self.pid.hold();
        self.command = 0;
    }

    /// Leave a latched stop
    pub fn release(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::info!("{}: released", self.name);
        self.actuator.release();
    }

    pub fn set_current_limit(&mut self, mode: CurrentLimit) {
        self.actuator.set_current_limit(mode);
    }

    /// Latest velocity estimate (rad/s)
    pub fn get_velocity(&self) -> f64 {
        self.estimator.velocity()
    }

    /// Accumulated output shaft angle (rad)
    pub fn get_position(&self) -> f64 {
        self.estimator.position()
    }

    /// Wheel angle (rad)
    pub fn get_wheel_angle(&self) -> f64 {
        self.estimator.wheel_angle()
    }

    /// Current status snapshot
    pub fn status(&self) -> MotorStatus {
        MotorStatus {
            velocity: self.estimator.velocity(),
            position: self.estimator.position(),
            wheel_angle: self.estimator.wheel_angle(),
            target: self.pid.target(),
            setpoint: self.pid.setpoint(),
            command: self.command,
            duty: self.actuator.duty(),
            actuator: self.actuator.state(),
            current_limit: self.actuator.current_limit(),
            stale: self.pid.is_stale(),
            saturated: self.pid.is_saturated(),
            encoder_faults: self.encoder.fault_count(),
            stale_events: self.pid.stale_events(),
            periods: self.periods,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn encoder(&self) -> &EncoderTracker<Q> {
        &self.encoder
    }

    pub fn estimator(&self) -> &VelocityEstimator {
        &self.estimator
    }
}
