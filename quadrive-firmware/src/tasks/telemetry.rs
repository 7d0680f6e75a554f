//! Periodic status report
//!
//! Logs what every motor task last published to its link.

use defmt::*;
use embassy_time::{Duration, Ticker};

use quadrive_core::config::MOTOR_BINDINGS;

use crate::channels::MOTOR_LINKS;

/// Report interval in milliseconds
pub const TELEMETRY_INTERVAL_MS: u64 = 500;

#[embassy_executor::task]
pub async fn telemetry_task() {
    info!("Telemetry task started");

    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_INTERVAL_MS));

    loop {
        ticker.next().await;

        for (binding, link) in MOTOR_BINDINGS.iter().zip(MOTOR_LINKS.iter()) {
            let status = link.status();
            debug!(
                "{}: v={} sp={} pos={} cmd={} duty={} {} stale={}",
                binding.name,
                status.velocity,
                status.setpoint,
                status.position,
                status.command,
                status.duty,
                status.actuator,
                status.stale
            );
            if status.encoder_faults > 0 {
                warn!("{}: {} encoder faults", binding.name, status.encoder_faults);
            }
        }
    }
}
