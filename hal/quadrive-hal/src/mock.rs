//! In-memory peripherals
//!
//! Stand-ins for the hardware used by host tests and simulations. The clock
//! and shaft are shared by reference so a test can move them while the
//! control code owns the counters reading them.

use core::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use crate::counter::{FreeRunningCounter, QuadratureCounter};
use crate::gpio::OutputPin;
use crate::pwm::PwmChannel;

/// Free-running counter advanced by hand
#[derive(Debug)]
pub struct MockClock {
    raw: AtomicU32,
    max: u32,
    hz: u32,
}

impl MockClock {
    pub const fn new(max: u32, hz: u32) -> Self {
        Self {
            raw: AtomicU32::new(0),
            max,
            hz,
        }
    }

    /// Set the raw count (masked into the counter range)
    pub fn set(&self, raw: u32) {
        let period = self.max as u64 + 1;
        self.raw.store((raw as u64 % period) as u32, Ordering::SeqCst);
    }

    /// Advance by `ticks`, rolling over like the hardware does
    pub fn advance(&self, ticks: u32) {
        let period = self.max as u64 + 1;
        let next = (self.raw.load(Ordering::SeqCst) as u64 + ticks as u64) % period;
        self.raw.store(next as u32, Ordering::SeqCst);
    }
}

impl FreeRunningCounter for MockClock {
    fn read_raw_count(&self) -> u32 {
        self.raw.load(Ordering::SeqCst)
    }

    fn max_count(&self) -> u32 {
        self.max
    }

    fn tick_hz(&self) -> u32 {
        self.hz
    }
}

/// Simulated motor shaft, in encoder counts
#[derive(Debug, Default)]
pub struct MockShaft {
    ticks: AtomicI64,
}

impl MockShaft {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicI64::new(0),
        }
    }

    /// Rotate by `ticks` encoder counts (negative turns backwards)
    pub fn rotate(&self, ticks: i64) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Total counts turned since creation
    pub fn ticks(&self) -> i64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

/// Quadrature counter attached to a [`MockShaft`]
///
/// Wraps at `max_count` in both directions like an encoder-mode timer.
#[derive(Debug)]
pub struct MockQuadrature<'a> {
    shaft: &'a MockShaft,
    range: i64,
    bias: i64,
}

impl<'a> MockQuadrature<'a> {
    pub fn new(shaft: &'a MockShaft, max_count: u32) -> Self {
        Self {
            shaft,
            range: max_count as i64 + 1,
            bias: 0,
        }
    }
}

impl QuadratureCounter for MockQuadrature<'_> {
    fn read_raw_count(&mut self) -> u32 {
        (self.bias + self.shaft.ticks()).rem_euclid(self.range) as u32
    }

    fn set_raw_count(&mut self, value: u32) {
        self.bias = (value as i64 - self.shaft.ticks()).rem_euclid(self.range);
    }
}

/// Output pin remembering its level
#[derive(Debug, Default, Clone, Copy)]
pub struct MockPin {
    high: bool,
    writes: u32,
}

impl MockPin {
    pub const fn new() -> Self {
        Self {
            high: false,
            writes: 0,
        }
    }

    /// Number of level writes
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
        self.writes += 1;
    }

    fn set_low(&mut self) {
        self.high = false;
        self.writes += 1;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// PWM channel remembering its compare value
#[derive(Debug, Clone, Copy)]
pub struct MockPwm {
    duty: u16,
    max: u16,
}

impl MockPwm {
    pub const fn new(max: u16) -> Self {
        Self { duty: 0, max }
    }
}

impl PwmChannel for MockPwm {
    fn set_duty(&mut self, duty: u16) {
        self.duty = duty.min(self.max);
    }

    fn max_duty(&self) -> u16 {
        self.max
    }

    fn duty(&self) -> u16 {
        self.duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_rolls_over() {
        let clock = MockClock::new(0xFFFF, 10_000);
        clock.set(0xFFF0);
        clock.advance(0x20);
        assert_eq!(clock.read_raw_count(), 0x10);
    }

    #[test]
    fn test_quadrature_follows_shaft() {
        let shaft = MockShaft::new();
        let mut counter = MockQuadrature::new(&shaft, 0xFFFF);
        counter.set_raw_count(5);

        shaft.rotate(-16);
        assert_eq!(counter.read_raw_count(), 0xFFFF - 10);

        shaft.rotate(20);
        assert_eq!(counter.read_raw_count(), 9);
    }

    #[test]
    fn test_pwm_clamps() {
        let mut pwm = MockPwm::new(1000);
        pwm.set_duty(5000);
        assert_eq!(pwm.duty(), 1000);
    }
}
