//! Embassy async tasks
//!
//! Each motor runs its own control loop; a telemetry task reports the
//! published status of all four.

pub mod motor;
pub mod telemetry;

pub use motor::{motor1_task, motor2_task, motor3_task, motor4_task};
pub use motor::SharedTimebase;
pub use telemetry::telemetry_task;
