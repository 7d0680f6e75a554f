//! Per-motor telemetry snapshot

use crate::config::CurrentLimit;
use crate::traits::ActuatorState;

/// Snapshot of one motor's control state, published every control period
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorStatus {
    /// Estimated output shaft velocity (rad/s)
    pub velocity: f64,
    /// Accumulated output shaft angle (rad)
    pub position: f64,
    /// Wheel angle (rad)
    pub wheel_angle: f64,
    /// Commanded target velocity (rad/s)
    pub target: f64,
    /// Working setpoint after ramping (rad/s)
    pub setpoint: f64,
    /// Last command sent to the actuator
    pub command: i16,
    /// Current PWM compare value
    pub duty: u16,
    pub actuator: ActuatorState,
    pub current_limit: CurrentLimit,
    /// Setpoint timeout has expired
    pub stale: bool,
    /// Controller output is at a bound
    pub saturated: bool,
    /// Encoder steps clamped as implausible
    pub encoder_faults: u32,
    /// Setpoint timeouts so far
    pub stale_events: u32,
    /// Control periods run
    pub periods: u32,
}

impl MotorStatus {
    /// Status of a motor that has not run yet
    pub const fn new() -> Self {
        Self {
            velocity: 0.0,
            position: 0.0,
            wheel_angle: 0.0,
            target: 0.0,
            setpoint: 0.0,
            command: 0,
            duty: 0,
            actuator: ActuatorState::Idle,
            current_limit: CurrentLimit::Full,
            stale: true,
            saturated: false,
            encoder_faults: 0,
            stale_events: 0,
            periods: 0,
        }
    }
}

impl Default for MotorStatus {
    fn default() -> Self {
        Self::new()
    }
}
