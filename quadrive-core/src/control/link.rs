//! Cross-task handoff for one motor
//!
//! A [`MotorLink`] is the only state shared between a motor's control task
//! and the rest of the firmware. Other tasks post setpoints, gains and stop
//! requests into it; the control task drains them at the start of each
//! period and publishes a [`MotorStatus`] snapshot at the end.
//!
//! Setpoints are written as the raw bits of an `f64` followed by a bump of
//! a generation counter (release/acquire), so a reader never observes a torn
//! value and can tell a repeated setpoint from a fresh one. That matters
//! for the staleness timeout: re-sending the same velocity must still count
//! as a new setpoint.

use core::cell::Cell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use portable_atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::config::PidGains;
use crate::motor::MotorStatus;

/// Stop request posted to a motor
///
/// Ordered by priority: when several arrive within one control period only
/// the highest is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StopRequest {
    /// Leave a latched stop
    Release = 1,
    /// Ramp the duty down
    Soft = 2,
    /// Cut the output immediately
    Emergency = 3,
}

impl StopRequest {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(StopRequest::Release),
            2 => Some(StopRequest::Soft),
            3 => Some(StopRequest::Emergency),
            _ => None,
        }
    }
}

/// Shared state between a motor control task and its clients
pub struct MotorLink {
    setpoint_bits: AtomicU64,
    generation: AtomicU32,
    stop: AtomicU8,
    gains: CriticalSectionMutex<Cell<Option<PidGains>>>,
    status: CriticalSectionMutex<Cell<MotorStatus>>,
}

impl MotorLink {
    pub const fn new() -> Self {
        Self {
            setpoint_bits: AtomicU64::new(0),
            generation: AtomicU32::new(0),
            stop: AtomicU8::new(0),
            gains: CriticalSectionMutex::new(Cell::new(None)),
            status: CriticalSectionMutex::new(Cell::new(MotorStatus::new())),
        }
    }

    /// Post a new target velocity in rad/s
    pub fn set_setpoint(&self, velocity: f64) {
        self.setpoint_bits.store(velocity.to_bits(), Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Take the latest setpoint if one was posted after `seen`
    ///
    /// `seen` is updated to the generation that was read.
    pub fn take_setpoint(&self, seen: &mut u32) -> Option<f64> {
        let generation = self.generation.load(Ordering::Acquire);
        if generation == *seen {
            return None;
        }
        *seen = generation;
        Some(f64::from_bits(self.setpoint_bits.load(Ordering::Relaxed)))
    }

    /// Current setpoint generation
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Post new gains, replacing any not yet applied
    pub fn set_gains(&self, gains: PidGains) {
        self.gains.lock(|cell| cell.set(Some(gains)));
    }

    /// Take gains posted since the last call
    pub fn take_gains(&self) -> Option<PidGains> {
        self.gains.lock(|cell| cell.take())
    }

    /// Post a stop request
    pub fn request(&self, request: StopRequest) {
        self.stop.fetch_max(request as u8, Ordering::AcqRel);
    }

    pub fn soft_stop(&self) {
        self.request(StopRequest::Soft);
    }

    pub fn emg_stop(&self) {
        self.request(StopRequest::Emergency);
    }

    pub fn release(&self) {
        self.request(StopRequest::Release);
    }

    /// Take the highest-priority stop request posted since the last call
    pub fn take_request(&self) -> Option<StopRequest> {
        StopRequest::from_u8(self.stop.swap(0, Ordering::AcqRel))
    }

    /// Publish a status snapshot
    pub fn publish(&self, status: MotorStatus) {
        self.status.lock(|cell| cell.set(status));
    }

    /// Latest published status
    pub fn status(&self) -> MotorStatus {
        self.status.lock(|cell| cell.get())
    }
}

impl Default for MotorLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setpoint_seen_once() {
        let link = MotorLink::new();
        let mut seen = link.generation();
        assert_eq!(link.take_setpoint(&mut seen), None);

        link.set_setpoint(-3.25);
        assert_eq!(link.take_setpoint(&mut seen), Some(-3.25));
        assert_eq!(link.take_setpoint(&mut seen), None);
    }

    #[test]
    fn test_repeated_setpoint_is_fresh() {
        let link = MotorLink::new();
        let mut seen = 0;
        link.set_setpoint(1.0);
        link.take_setpoint(&mut seen);

        link.set_setpoint(1.0);
        assert_eq!(link.take_setpoint(&mut seen), Some(1.0));
    }

    #[test]
    fn test_latest_setpoint_wins() {
        let link = MotorLink::new();
        let mut seen = 0;
        link.set_setpoint(1.0);
        link.set_setpoint(2.0);
        assert_eq!(link.take_setpoint(&mut seen), Some(2.0));
    }

    #[test]
    fn test_gains_taken_once() {
        let link = MotorLink::new();
        link.set_gains(PidGains::new(1.0, 0.5, 0.0));
        assert_eq!(link.take_gains(), Some(PidGains::new(1.0, 0.5, 0.0)));
        assert_eq!(link.take_gains(), None);
    }

    #[test]
    fn test_emergency_outranks_soft_stop() {
        let link = MotorLink::new();
        link.soft_stop();
        link.emg_stop();
        link.release();
        assert_eq!(link.take_request(), Some(StopRequest::Emergency));
        assert_eq!(link.take_request(), None);
    }

    #[test]
    fn test_status_round_trip() {
        let link = MotorLink::new();
        assert_eq!(link.status(), MotorStatus::new());

        let status = MotorStatus {
            velocity: 4.5,
            duty: 120,
            ..MotorStatus::new()
        };
        link.publish(status);
        assert_eq!(link.status().velocity, 4.5);
        assert_eq!(link.status().duty, 120);
    }

    #[test]
    fn test_setpoint_across_threads() {
        static LINK: MotorLink = MotorLink::new();

        let writer = std::thread::spawn(|| {
            for i in 1..=1000 {
                LINK.set_setpoint(i as f64);
            }
        });

        let mut seen = 0;
        let mut last = 0.0;
        while last < 1000.0 {
            if let Some(v) = LINK.take_setpoint(&mut seen) {
                // Values only move forward and are never torn
                assert!(v >= last && v.fract() == 0.0);
                last = v;
            }
        }
        writer.join().unwrap();
    }
}
