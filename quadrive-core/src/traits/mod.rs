//! Hardware abstraction traits
//!
//! Peripheral-level capabilities (counters, PWM, pins) live in
//! `quadrive-hal`; this module holds the device-level seams between the
//! control logic and driver implementations.

pub mod motor;

pub use motor::{ActuatorState, MotorActuator};
