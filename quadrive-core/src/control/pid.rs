//! Velocity PID controller
//!
//! One instance per motor, invoked once per control period. Each call:
//!
//! - advances the setpoint ramp (when enabled) toward the target
//! - checks setpoint staleness and fails safe to zero when it expires
//! - computes `error = setpoint - measured` with fixed `dt = 1 / frequency`
//! - integrates with conditional anti-windup
//! - clamps the output to `±output_limit`
//!
//! Output is in the same units as the setpoint (rad/s equivalent). The
//! caller maps it to an actuator command.

use crate::config::{ConfigError, PidConfig, PidGains};
use crate::motion::SetpointRamp;

/// PID controller state
pub struct PidController {
    config: PidConfig,
    gains: PidGains,
    ramp: SetpointRamp,
    /// Control period in seconds
    dt: f64,
    /// Accumulated `error * dt`
    error_sum: f64,
    last_error: f64,
    /// Skip the derivative term on the first computation after a reset
    first_update: bool,
    output: f64,
    /// Periods since the last `set_setpoint`
    periods_since_setpoint: u32,
    timeout_periods: u32,
    stale: bool,
    /// Number of times the setpoint went stale
    stale_events: u32,
    saturated: bool,
}

impl PidController {
    /// Create a controller
    ///
    /// Starts stopped: target and working setpoint are 0, the staleness
    /// counter is expired until the first `set_setpoint`.
    pub fn new(config: PidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dt = config.period_s();
        let timeout_periods = config.timeout_periods();

        Ok(Self {
            config,
            gains: config.gains,
            ramp: SetpointRamp::new(&config.ramp, dt),
            dt,
            error_sum: 0.0,
            last_error: 0.0,
            first_update: true,
            output: 0.0,
            periods_since_setpoint: timeout_periods,
            timeout_periods,
            stale: true,
            stale_events: 0,
            saturated: false,
        })
    }

    /// Record a new target velocity and restart the staleness timer
    ///
    /// The target is limited to the output bounds. Non-finite values are
    /// ignored and do not refresh the timer.
    pub fn set_setpoint(&mut self, target: f64) {
        if !target.is_finite() {
            #[cfg(feature = "defmt")]
            defmt::warn!("ignoring non-finite setpoint");
            return;
        }

        let limit = self.config.output_limit;
        self.ramp.set_target(target.clamp(-limit, limit));
        self.periods_since_setpoint = 0;
        self.stale = false;
    }

    /// Replace the gains
    ///
    /// Accumulated state is kept so a live retune does not bump the output.
    pub fn set_gains(&mut self, gains: PidGains) -> Result<(), ConfigError> {
        gains.validate()?;
        self.gains = gains;
        if gains.ki == 0.0 {
            self.error_sum = 0.0;
        }
        Ok(())
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Run one control period against the measured velocity
    ///
    /// Returns the bounded output.
    pub fn handler(&mut self, measured: f64) -> f64 {
        let setpoint = self.ramp.update();

        if self.check_stale() {
            return self.output;
        }

        // A broken measurement must not reach the integrator
        if !measured.is_finite() {
            self.output = 0.0;
            return self.output;
        }

        let limit = self.config.output_limit;
        let error = setpoint - measured;
        let derivative = if self.first_update {
            0.0
        } else {
            (error - self.last_error) / self.dt
        };

        let p_term = self.gains.kp * error;
        let d_term = self.gains.kd * derivative;

        // Conditional integration: keep the previous sum when integrating
        // would push a saturated output further into saturation
        let candidate = self.error_sum + error * self.dt;
        let unclamped = p_term + self.gains.ki * candidate + d_term;
        let winding_up = (unclamped > limit && error > 0.0) || (unclamped < -limit && error < 0.0);
        if !winding_up {
            self.error_sum = candidate;
        }
        if self.gains.ki > 0.0 {
            let sum_limit = limit / self.gains.ki;
            self.error_sum = self.error_sum.clamp(-sum_limit, sum_limit);
        }

        let raw = p_term + self.gains.ki * self.error_sum + d_term;
        self.output = raw.clamp(-limit, limit);
        self.saturated = libm::fabs(self.output) >= limit;
        self.last_error = error;
        self.first_update = false;

        self.output
    }

    /// Keep time without driving the output
    ///
    /// Used while the actuator is stopped: staleness is still tracked, the
    /// accumulated state and working setpoint are cleared so the motor
    /// restarts from rest once released.
    pub fn hold(&mut self) {
        self.check_stale();
        let target = self.ramp.target();
        self.ramp.force(0.0);
        self.ramp.set_target(target);
        self.clear_state();
    }

    /// Clear accumulated state and force the setpoint to zero
    pub fn reset(&mut self) {
        self.ramp.force(0.0);
        self.clear_state();
    }

    fn clear_state(&mut self) {
        self.error_sum = 0.0;
        self.last_error = 0.0;
        self.first_update = true;
        self.output = 0.0;
        self.saturated = false;
    }

    /// Count one period and apply the fail-safe when the setpoint expired
    ///
    /// Returns `true` when the setpoint is stale.
    fn check_stale(&mut self) -> bool {
        self.periods_since_setpoint = self.periods_since_setpoint.saturating_add(1);
        if self.periods_since_setpoint <= self.timeout_periods {
            return false;
        }

        if !self.stale {
            self.stale = true;
            self.stale_events = self.stale_events.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "setpoint stale after {} periods, stopping",
                self.periods_since_setpoint
            );
        }
        self.reset();
        true
    }

    /// Last computed output
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Working setpoint (after ramping)
    pub fn setpoint(&self) -> f64 {
        self.ramp.current()
    }

    /// Commanded target
    pub fn target(&self) -> f64 {
        self.ramp.target()
    }

    pub fn error_sum(&self) -> f64 {
        self.error_sum
    }

    /// Check if the setpoint timeout has expired
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn stale_events(&self) -> u32 {
        self.stale_events
    }

    /// Check if the last output hit a bound
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn ramp(&self) -> &SetpointRamp {
        &self.ramp
    }
}

/// Map a bounded controller output onto the actuator command range
///
/// `±limit` maps to `±i16::MAX`; out-of-range outputs saturate.
pub fn output_to_command(output: f64, limit: f64) -> i16 {
    if !output.is_finite() || limit <= 0.0 {
        return 0;
    }
    let scaled = (output / limit).clamp(-1.0, 1.0) * i16::MAX as f64;
    libm::round(scaled) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RampConfig, MAX_ANG_VEL, PID_FREQ};

    fn config(kp: f64, ki: f64, kd: f64) -> PidConfig {
        PidConfig {
            gains: PidGains::new(kp, ki, kd),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = PidConfig {
            output_limit: -1.0,
            ..Default::default()
        };
        assert_eq!(PidController::new(bad).err(), Some(ConfigError::InvalidOutputLimit));
    }

    #[test]
    fn test_stale_until_first_setpoint() {
        let mut pid = PidController::new(config(1.0, 0.0, 0.0)).unwrap();
        assert!(pid.is_stale());
        assert_eq!(pid.handler(-3.0), 0.0);

        pid.set_setpoint(2.0);
        assert!(!pid.is_stale());
        assert_eq!(pid.handler(0.0), 2.0);
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(config(0.3, 0.0, 0.0)).unwrap();
        pid.set_setpoint(10.0);
        let out = pid.handler(4.0);
        assert!((out - 1.8).abs() < 1e-12);
        assert!(!pid.is_saturated());
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::new(config(10.0, 0.0, 0.0)).unwrap();
        pid.set_setpoint(MAX_ANG_VEL);
        assert_eq!(pid.handler(0.0), MAX_ANG_VEL);
        assert!(pid.is_saturated());

        pid.set_setpoint(-MAX_ANG_VEL);
        assert_eq!(pid.handler(0.0), -MAX_ANG_VEL);
    }

    #[test]
    fn test_setpoint_limited_to_output_range() {
        let mut pid = PidController::new(config(1.0, 0.0, 0.0)).unwrap();
        pid.set_setpoint(1000.0);
        assert_eq!(pid.target(), MAX_ANG_VEL);
    }

    #[test]
    fn test_non_finite_setpoint_ignored() {
        let mut pid = PidController::new(config(1.0, 0.0, 0.0)).unwrap();
        pid.set_setpoint(3.0);
        pid.set_setpoint(f64::NAN);
        assert_eq!(pid.target(), 3.0);
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = PidController::new(config(0.0, 1.0, 0.0)).unwrap();
        pid.set_setpoint(1.0);
        for _ in 0..PID_FREQ {
            pid.handler(0.0);
        }
        // One second of unit error
        assert!((pid.output() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_anti_windup_bounds_integral() {
        let mut pid = PidController::new(config(0.5, 5.0, 0.0)).unwrap();
        // Motor stalled: error stays large for ten seconds while the
        // setpoint keeps arriving, so the timeout never fires
        for _ in 0..PID_FREQ * 10 {
            pid.set_setpoint(MAX_ANG_VEL);
            let out = pid.handler(0.0);
            assert!(out <= MAX_ANG_VEL && out >= -MAX_ANG_VEL);
        }
        assert!(!pid.is_stale());
        assert!(pid.is_saturated());
        // The integral only fills the headroom left by the P term
        let headroom = MAX_ANG_VEL - 0.5 * MAX_ANG_VEL;
        assert!(pid.gains().ki * pid.error_sum() <= headroom + 1e-9);
        assert!(pid.output() > MAX_ANG_VEL - 0.5);

        // Once the error reverses the output drops right away
        let out = pid.handler(MAX_ANG_VEL + 5.0);
        assert!(out < headroom);
    }

    #[test]
    fn test_anti_windup_allows_unwinding() {
        let mut pid = PidController::new(config(0.0, 1.0, 0.0)).unwrap();
        pid.set_setpoint(5.0);
        for _ in 0..PID_FREQ {
            pid.handler(0.0);
        }
        let before = pid.error_sum();

        // Negative error always integrates, even when saturated high
        pid.handler(10.0);
        assert!(pid.error_sum() < before);
    }

    #[test]
    fn test_derivative_skips_first_update() {
        let mut pid = PidController::new(config(0.0, 0.0, 1.0)).unwrap();
        pid.set_setpoint(1.0);
        assert_eq!(pid.handler(0.0), 0.0);

        // Error drops from 1.0 to 0.99 in one period
        let out = pid.handler(0.01);
        let expected = -0.01 * PID_FREQ as f64;
        assert!((out - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_limits_setpoint_change() {
        let cfg = PidConfig {
            gains: PidGains::new(1.0, 0.0, 0.0),
            ramp: RampConfig {
                enabled: true,
                acceleration: 3.0,
            },
            ..Default::default()
        };
        let mut pid = PidController::new(cfg).unwrap();
        pid.set_setpoint(10.0);

        let step = 3.0 / PID_FREQ as f64;
        let mut prev = 0.0;
        for _ in 0..50 {
            pid.handler(0.0);
            let sp = pid.setpoint();
            assert!(sp - prev <= step + 1e-12);
            prev = sp;
        }
        assert!((pid.setpoint() - 50.0 * step).abs() < 1e-9);
    }

    #[test]
    fn test_stale_setpoint_forces_zero() {
        let mut pid = PidController::new(config(0.5, 2.0, 0.0)).unwrap();
        let timeout = pid.config().timeout_periods();
        pid.set_setpoint(8.0);

        for _ in 0..timeout {
            assert!(pid.handler(1.0) > 0.0);
        }
        assert!(!pid.is_stale());

        // First period past the timeout
        assert_eq!(pid.handler(1.0), 0.0);
        assert!(pid.is_stale());
        assert_eq!(pid.setpoint(), 0.0);
        assert_eq!(pid.target(), 0.0);
        assert_eq!(pid.error_sum(), 0.0);
        assert_eq!(pid.stale_events(), 1);

        // Stays at zero and counts the event once
        for _ in 0..10 {
            assert_eq!(pid.handler(-4.0), 0.0);
        }
        assert_eq!(pid.stale_events(), 1);

        // A fresh setpoint resumes control
        pid.set_setpoint(1.0);
        assert!(pid.handler(0.0) > 0.0);
    }

    #[test]
    fn test_stale_skips_ramp() {
        let cfg = PidConfig {
            ramp: RampConfig {
                enabled: true,
                acceleration: 0.5,
            },
            setpoint_timeout_ms: 10,
            ..Default::default()
        };
        let mut pid = PidController::new(cfg).unwrap();
        pid.set_setpoint(5.0);
        for _ in 0..cfg.timeout_periods() {
            pid.handler(0.0);
        }
        assert!(pid.setpoint() > 0.0);

        pid.handler(0.0);
        assert_eq!(pid.setpoint(), 0.0);
    }

    #[test]
    fn test_hold_keeps_target_and_clears_state() {
        let mut pid = PidController::new(config(0.0, 1.0, 0.0)).unwrap();
        pid.set_setpoint(4.0);
        for _ in 0..30 {
            pid.handler(0.0);
        }
        pid.hold();
        assert_eq!(pid.error_sum(), 0.0);
        assert_eq!(pid.output(), 0.0);
        assert_eq!(pid.target(), 4.0);
    }

    #[test]
    fn test_set_gains_validates() {
        let mut pid = PidController::new(config(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(
            pid.set_gains(PidGains::new(f64::NAN, 0.0, 0.0)),
            Err(ConfigError::InvalidGain)
        );
        assert_eq!(pid.set_gains(PidGains::new(2.0, 0.1, 0.0)), Ok(()));
        assert_eq!(pid.gains().kp, 2.0);
    }

    #[test]
    fn test_output_to_command() {
        assert_eq!(output_to_command(MAX_ANG_VEL, MAX_ANG_VEL), i16::MAX);
        assert_eq!(output_to_command(-MAX_ANG_VEL, MAX_ANG_VEL), -i16::MAX);
        assert_eq!(output_to_command(0.0, MAX_ANG_VEL), 0);
        assert_eq!(output_to_command(100.0, MAX_ANG_VEL), i16::MAX);
        assert_eq!(output_to_command(MAX_ANG_VEL / 2.0, MAX_ANG_VEL), 16384);
        assert_eq!(output_to_command(f64::NAN, MAX_ANG_VEL), 0);
    }
}
