//! Motor channels
//!
//! Composition of the encoder, estimator, controller and actuator for one
//! motor, plus the telemetry snapshot it publishes.

pub mod channel;
pub mod status;

pub use channel::MotorChannel;
pub use status::MotorStatus;
