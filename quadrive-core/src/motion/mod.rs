//! Motion estimation and setpoint shaping

pub mod ramp;
pub mod velocity;

pub use ramp::{RampState, SetpointRamp};
pub use velocity::{wrap_angle, VelocityEstimator};
