//! Setpoint ramp
//!
//! Moves the PID working setpoint toward the commanded target at a bounded
//! acceleration, so a step in the command does not become a current spike.

use crate::config::RampConfig;

/// Current ramp state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampState {
    /// Working setpoint equals the target
    AtTarget,
    /// Working setpoint is moving up toward the target
    RampingUp,
    /// Working setpoint is moving down toward the target
    RampingDown,
}

/// Acceleration-limited setpoint follower
#[derive(Debug, Clone)]
pub struct SetpointRamp {
    /// Working setpoint (rad/s)
    current: f64,
    /// Commanded target (rad/s)
    target: f64,
    /// Largest change per control period (rad/s)
    max_step: f64,
    enabled: bool,
}

impl SetpointRamp {
    /// Create a ramp for a control loop with period `period_s`
    pub fn new(config: &RampConfig, period_s: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            max_step: config.acceleration * period_s,
            enabled: config.enabled,
        }
    }

    /// Set the target setpoint
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Get the target setpoint
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Get the working setpoint
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Largest change per period
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> RampState {
        if self.current < self.target {
            RampState::RampingUp
        } else if self.current > self.target {
            RampState::RampingDown
        } else {
            RampState::AtTarget
        }
    }

    /// Advance one control period
    ///
    /// Returns the new working setpoint. Never moves by more than
    /// `max_step` and never passes the target.
    pub fn update(&mut self) -> f64 {
        if !self.enabled {
            self.current = self.target;
            return self.current;
        }

        let diff = self.target - self.current;
        if libm::fabs(diff) <= self.max_step {
            self.current = self.target;
        } else if diff > 0.0 {
            self.current += self.max_step;
        } else {
            self.current -= self.max_step;
        }

        self.current
    }

    /// Jump both target and working setpoint to `value`
    pub fn force(&mut self, value: f64) {
        self.target = value;
        self.current = value;
    }

    /// Number of periods needed to reach the target from here
    pub fn periods_to_target(&self) -> u32 {
        if !self.enabled || self.max_step <= 0.0 {
            return if self.current == self.target { 0 } else { 1 };
        }
        libm::ceil(libm::fabs(self.target - self.current) / self.max_step) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(acceleration: f64, period_s: f64) -> SetpointRamp {
        SetpointRamp::new(
            &RampConfig {
                enabled: true,
                acceleration,
            },
            period_s,
        )
    }

    #[test]
    fn test_disabled_tracks_target() {
        let mut ramp = SetpointRamp::new(&RampConfig::default(), 1.0 / 300.0);
        assert!(!ramp.is_enabled());

        ramp.set_target(12.0);
        assert_eq!(ramp.update(), 12.0);
        assert_eq!(ramp.state(), RampState::AtTarget);
    }

    #[test]
    fn test_ramp_bound_and_arrival() {
        let period = 1.0 / 300.0;
        let accel = 2.0;
        let mut ramp = ramp(accel, period);
        ramp.set_target(1.0);

        let expected_periods = ramp.periods_to_target();
        assert_eq!(expected_periods, (1.0_f64 / (accel * period)).ceil() as u32);

        let mut prev = ramp.current();
        for _ in 0..expected_periods {
            let next = ramp.update();
            assert!(next >= prev);
            assert!(next - prev <= accel * period + 1e-12);
            prev = next;
        }
        assert!((ramp.current() - 1.0).abs() < 1e-9);
        assert_eq!(ramp.state(), RampState::AtTarget);
    }

    #[test]
    fn test_ramp_down_through_zero() {
        let mut ramp = ramp(10.0, 0.1); // 1 rad/s per period
        ramp.force(2.0);
        ramp.set_target(-1.5);
        assert_eq!(ramp.state(), RampState::RampingDown);

        assert_eq!(ramp.update(), 1.0);
        assert_eq!(ramp.update(), 0.0);
        assert_eq!(ramp.update(), -1.0);
        assert_eq!(ramp.update(), -1.5);
        assert_eq!(ramp.update(), -1.5);
    }

    #[test]
    fn test_target_change_mid_ramp() {
        let mut ramp = ramp(10.0, 0.1);
        ramp.set_target(5.0);
        ramp.update();
        ramp.update();
        assert_eq!(ramp.current(), 2.0);

        // Reversal never jumps: still one step per period
        ramp.set_target(0.0);
        assert_eq!(ramp.update(), 1.0);
    }

    #[test]
    fn test_force_skips_ramp() {
        let mut ramp = ramp(1.0, 0.01);
        ramp.set_target(10.0);
        ramp.update();
        ramp.force(0.0);
        assert_eq!(ramp.current(), 0.0);
        assert_eq!(ramp.target(), 0.0);
    }
}
