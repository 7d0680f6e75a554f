//! Inter-task communication
//!
//! One [`MotorLink`] per motor. Anything that commands the motors (a host
//! link, a test harness) writes setpoints, gains and stop requests here;
//! the motor tasks consume them at the start of each control period and
//! publish their status back.

use quadrive_core::config::MOTOR_COUNT;
use quadrive_core::control::MotorLink;

/// Command and telemetry slots, indexed like `MOTOR_BINDINGS`
pub static MOTOR_LINKS: [MotorLink; MOTOR_COUNT] = [
    MotorLink::new(),
    MotorLink::new(),
    MotorLink::new(),
    MotorLink::new(),
];
