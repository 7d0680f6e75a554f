//! Velocity control
//!
//! - [`PidController`]: per-motor PID with ramp and setpoint timeout
//! - [`MotorLink`]: lock-free setpoint and telemetry handoff between tasks

pub mod link;
pub mod pid;

pub use link::{MotorLink, StopRequest};
pub use pid::{output_to_command, PidController};
