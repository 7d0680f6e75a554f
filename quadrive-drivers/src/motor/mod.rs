//! Motor driver implementations
//!
//! - H-bridge: PWM on the bridge enable, two direction inputs and a
//!   current-limit select line

pub mod hbridge;

pub use hbridge::{HBridgeConfig, HBridgeMotor};
