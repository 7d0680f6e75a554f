//! Board constants
//!
//! Values for the four-motor drive board: encoder and timebase timer
//! layout, gearmotor geometry and the default control tuning.

use core::f64::consts::PI;

/// Highest value of the 16-bit encoder counters
pub const ENC_MAX_CNT: u32 = 0xFFFF;

/// Number of distinct encoder counter values
pub const ENC_RANGE: u32 = ENC_MAX_CNT + 1;

/// Neutral midpoint the encoder counters are centred on
pub const ENC_CNT_OFFSET: u32 = ENC_MAX_CNT / 2;

/// Control loop frequency in Hz (max 1000)
pub const PID_FREQ: u32 = 300;

/// Upper bound on the control loop frequency
pub const PID_FREQ_MAX: u32 = 1000;

pub const PID_DEFAULT_KP: f64 = 0.3;
pub const PID_DEFAULT_KI: f64 = 0.0;
pub const PID_DEFAULT_KD: f64 = 0.0;

/// Motor PWM carrier frequency in Hz
pub const MOTORS_PWM_FREQUENCY: u32 = 15_000;

/// Setpoint staleness timeout in ms
pub const MOTORS_PID_SETPOINT_TIMEOUT: u32 = 3000;

/// Timebase tick frequency in Hz
pub const TIMEBASE_TIMER_FREQ: u32 = 10_000;

/// Timebase auto-reload value
pub const TIMEBASE_TIMER_OVERFLOW_VALUE: u32 = 0xFFFF;

/// Encoder counts per motor shaft revolution (after x4 decoding)
pub const ENC_RESOLUTION: u32 = 64;

/// Gearbox reduction between motor shaft and output shaft
pub const GEARBOX_RATIO: u32 = 50;

/// Encoder counts per output shaft radian
pub const IMP_PER_RAD: f64 = (ENC_RESOLUTION * GEARBOX_RATIO) as f64 / (2.0 * PI);

/// Highest reachable output shaft velocity in rad/s
pub const MAX_ANG_VEL: f64 = 20.0;

/// Setpoint ramp acceleration in rad/s²
pub const RAMP_ACCELERATION: f64 = 2.0;

/// Whether setpoints are ramped by default
pub const RAMP_FLAG: bool = false;

/// Number of control periods a soft stop takes to reach zero duty
pub const SOFT_STOP_PERIODS: u16 = 30;

/// ILIM pin level selecting full current
pub const MAX_CURRENT: u8 = 0x01;

/// ILIM pin level selecting reduced current
pub const REDUCED_CURRENT: u8 = 0x00;

/// Number of motors on the board
pub const MOTOR_COUNT: usize = 4;
