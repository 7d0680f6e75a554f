//! Configuration type definitions
//!
//! Runtime configuration for one motor's control pipeline. Every struct has
//! a `Default` built from the board constants, so a motor is usually set up
//! with `MotorConfig::for_binding(&MOTOR_BINDINGS[n])` and a few overrides.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::bindings::MotorBinding;
use super::constants::*;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Control frequency is zero or above `PID_FREQ_MAX`
    InvalidFrequency,
    /// Output bounds are not a positive, finite magnitude
    InvalidOutputLimit,
    /// Ramp acceleration is not positive and finite
    InvalidAcceleration,
    /// A gain is negative or not finite
    InvalidGain,
    /// Encoder counts per radian is not positive and finite
    InvalidResolution,
    /// Encoder range is too small to decode a direction
    InvalidEncoderRange,
    /// A pin is used by two bindings
    PinConflict,
    /// Too many motor bindings
    TooManyMotors,
}

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Clockwise rotation
    Clockwise,
    /// Counter-clockwise rotation
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Board-header encoding: 1 (CW) or -1 (CCW)
    pub const fn sign(self) -> i8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// Decode the board-header encoding; anything non-negative is CW
    pub const fn from_sign(sign: i8) -> Self {
        if sign < 0 {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        }
    }
}

/// Driver current-limit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CurrentLimit {
    /// Full driver current (ILIM high)
    #[default]
    Full,
    /// Reduced driver current (ILIM low)
    Reduced,
}

impl CurrentLimit {
    /// ILIM pin level for this mode
    pub const fn ilim_level(self) -> u8 {
        match self {
            CurrentLimit::Full => MAX_CURRENT,
            CurrentLimit::Reduced => REDUCED_CURRENT,
        }
    }

    /// Decode an ILIM level (`MAX_CURRENT` / `REDUCED_CURRENT`)
    pub const fn from_level(level: u8) -> Self {
        if level == MAX_CURRENT {
            CurrentLimit::Full
        } else {
            CurrentLimit::Reduced
        }
    }
}

/// How the wheel angle telemetry is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AngleWrap {
    /// Wrapped into `[0, 2π)`
    #[default]
    Wrapped,
    /// Accumulated without bound
    Unbounded,
}

/// Encoder tracker configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncoderConfig {
    /// Number of distinct counter values (`max_count + 1`)
    pub range: u32,
    /// Value the counter is centred on at startup
    pub offset: u32,
    /// Largest believable step between two updates, in counts
    ///
    /// Larger corrected steps are clamped and counted as sensor faults.
    pub max_step: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            range: ENC_RANGE,
            offset: ENC_CNT_OFFSET,
            max_step: ENC_RANGE / 4,
        }
    }
}

impl EncoderConfig {
    /// Check that the range can tell direction apart and the limits fit in it
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.range < 4 || self.offset >= self.range {
            return Err(ConfigError::InvalidEncoderRange);
        }
        if self.max_step == 0 || self.max_step > self.range / 2 {
            return Err(ConfigError::InvalidEncoderRange);
        }
        Ok(())
    }
}

/// Velocity estimator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimatorConfig {
    /// Encoder counts per output shaft radian
    pub imp_per_rad: f64,
    /// Wheel revolutions per output shaft revolution
    pub wheel_ratio: f64,
    /// Wheel angle reporting mode
    pub wheel_wrap: AngleWrap,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            imp_per_rad: IMP_PER_RAD,
            wheel_ratio: 1.0,
            wheel_wrap: AngleWrap::Wrapped,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.imp_per_rad.is_finite() && self.imp_per_rad > 0.0) {
            return Err(ConfigError::InvalidResolution);
        }
        if !(self.wheel_ratio.is_finite() && self.wheel_ratio > 0.0) {
            return Err(ConfigError::InvalidResolution);
        }
        Ok(())
    }
}

/// PID gains
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidGains {
    /// Proportional gain (Kp)
    pub kp: f64,
    /// Integral gain (Ki)
    pub ki: f64,
    /// Derivative gain (Kd)
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: PID_DEFAULT_KP,
            ki: PID_DEFAULT_KI,
            kd: PID_DEFAULT_KD,
        }
    }
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = |g: f64| g.is_finite() && g >= 0.0;
        if ok(self.kp) && ok(self.ki) && ok(self.kd) {
            Ok(())
        } else {
            Err(ConfigError::InvalidGain)
        }
    }
}

/// Setpoint ramp configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RampConfig {
    /// Ramp the working setpoint instead of stepping it
    pub enabled: bool,
    /// Acceleration limit in rad/s²
    pub acceleration: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            enabled: RAMP_FLAG,
            acceleration: RAMP_ACCELERATION,
        }
    }
}

/// PID controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidConfig {
    /// Initial gains
    pub gains: PidGains,
    /// Handler invocation frequency in Hz
    pub frequency_hz: u32,
    /// Output magnitude limit (rad/s equivalent); bounds are `±output_limit`
    pub output_limit: f64,
    /// Setpoint ramp shaping
    pub ramp: RampConfig,
    /// Time without a new setpoint before the motor is stopped, in ms
    pub setpoint_timeout_ms: u32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            frequency_hz: PID_FREQ,
            output_limit: MAX_ANG_VEL,
            ramp: RampConfig::default(),
            setpoint_timeout_ms: MOTORS_PID_SETPOINT_TIMEOUT,
        }
    }
}

impl PidConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_hz == 0 || self.frequency_hz > PID_FREQ_MAX {
            return Err(ConfigError::InvalidFrequency);
        }
        if !(self.output_limit.is_finite() && self.output_limit > 0.0) {
            return Err(ConfigError::InvalidOutputLimit);
        }
        if self.ramp.enabled
            && !(self.ramp.acceleration.is_finite() && self.ramp.acceleration > 0.0)
        {
            return Err(ConfigError::InvalidAcceleration);
        }
        self.gains.validate()
    }

    /// Control period in seconds
    pub fn period_s(&self) -> f64 {
        1.0 / self.frequency_hz as f64
    }

    /// Staleness timeout expressed in control periods
    pub fn timeout_periods(&self) -> u32 {
        let periods = self.setpoint_timeout_ms as u64 * self.frequency_hz as u64 / 1000;
        periods.min(u32::MAX as u64) as u32
    }
}

/// Complete per-motor configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorConfig {
    /// Physical rotation produced by a positive command
    pub default_dir: Direction,
    /// Current limit applied at startup
    pub current_limit: CurrentLimit,
    /// Number of control periods a soft stop takes
    pub soft_stop_periods: u16,
    pub encoder: EncoderConfig,
    pub estimator: EstimatorConfig,
    pub pid: PidConfig,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            default_dir: Direction::Clockwise,
            current_limit: CurrentLimit::Full,
            soft_stop_periods: SOFT_STOP_PERIODS,
            encoder: EncoderConfig::default(),
            estimator: EstimatorConfig::default(),
            pid: PidConfig::default(),
        }
    }
}

impl MotorConfig {
    /// Default configuration for one of the board's motor bindings
    pub fn for_binding(binding: &MotorBinding) -> Self {
        Self {
            default_dir: binding.default_dir,
            ..Self::default()
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.encoder.validate()?;
        self.estimator.validate()?;
        self.pid.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(MotorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_timeout_periods() {
        let config = PidConfig::default();
        // 3000 ms at 300 Hz
        assert_eq!(config.timeout_periods(), 900);
    }

    #[test]
    fn test_rejects_bad_frequency() {
        let config = PidConfig {
            frequency_hz: 2000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequency));

        let config = PidConfig {
            frequency_hz: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequency));
    }

    #[test]
    fn test_rejects_negative_gain() {
        let config = PidConfig {
            gains: PidGains::new(1.0, -0.1, 0.0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidGain));
    }

    #[test]
    fn test_ramp_acceleration_checked_only_when_enabled() {
        let mut config = PidConfig::default();
        config.ramp.acceleration = 0.0;
        assert_eq!(config.validate(), Ok(()));

        config.ramp.enabled = true;
        assert_eq!(config.validate(), Err(ConfigError::InvalidAcceleration));
    }

    #[test]
    fn test_encoder_range_checks() {
        let config = EncoderConfig {
            max_step: ENC_RANGE,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidEncoderRange));
    }

    #[test]
    fn test_direction_sign_round_trip() {
        assert_eq!(Direction::from_sign(-1), Direction::CounterClockwise);
        assert_eq!(Direction::from_sign(1), Direction::Clockwise);
        assert_eq!(Direction::CounterClockwise.sign(), -1);
        assert_eq!(Direction::Clockwise.opposite(), Direction::CounterClockwise);
    }

    #[test]
    fn test_current_limit_levels() {
        assert_eq!(CurrentLimit::Full.ilim_level(), MAX_CURRENT);
        assert_eq!(CurrentLimit::Reduced.ilim_level(), REDUCED_CURRENT);
        assert_eq!(CurrentLimit::from_level(0x01), CurrentLimit::Full);
        assert_eq!(CurrentLimit::from_level(0x00), CurrentLimit::Reduced);
    }
}
