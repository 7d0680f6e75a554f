//! Shared timebase
//!
//! Extends a free-running 16-bit hardware counter into a 64-bit tick count
//! that does not wrap for the lifetime of the firmware.
//!
//! # Polling obligation
//!
//! Overflow is detected by comparing each raw read with the previous one,
//! so at most one hardware overflow may happen between two consecutive
//! reads of the service (from any motor). With a 10 kHz tick and a 0xFFFF
//! auto-reload the overflow period is about 6.5 s, while every motor loop
//! reads the timebase at `PID_FREQ`. If the service is not read for longer
//! than one overflow period the result is undefined.
//!
//! # Concurrency
//!
//! The read-and-overflow-check sequence runs inside a critical section, so
//! one [`Timebase`] can be shared by reference between all motor tasks.

use core::cell::Cell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use quadrive_hal::FreeRunningCounter;

/// Absolute time in timebase ticks since the service started counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AbsoluteTime(u64);

impl AbsoluteTime {
    pub const ZERO: Self = Self(0);

    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Ticks from `earlier` to `self`, zero if `earlier` is later
    pub const fn saturating_ticks_since(self, earlier: AbsoluteTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// A non-negative span of timebase ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickSpan {
    ticks: u64,
    tick_hz: u32,
}

impl TickSpan {
    pub const fn new(ticks: u64, tick_hz: u32) -> Self {
        Self { ticks, tick_hz }
    }

    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub const fn is_zero(&self) -> bool {
        self.ticks == 0
    }

    /// Span in seconds, 0 for a counter without a tick rate
    pub fn as_secs_f64(&self) -> f64 {
        if self.tick_hz == 0 {
            return 0.0;
        }
        self.ticks as f64 / self.tick_hz as f64
    }

    /// Span in whole microseconds (rounded down), 0 for a counter without a
    /// tick rate
    pub fn as_micros(&self) -> u64 {
        if self.tick_hz == 0 {
            return 0;
        }
        (self.ticks as u128 * 1_000_000 / self.tick_hz as u128) as u64
    }
}

/// Ticks between two raw counter samples, allowing one overflow in between
///
/// `period` is the number of distinct counter values (`max_count + 1`).
/// When `curr < prev` the counter is assumed to have rolled over exactly
/// once.
pub const fn wrapping_elapsed(prev_raw: u32, curr_raw: u32, period: u64) -> u64 {
    if curr_raw >= prev_raw {
        (curr_raw - prev_raw) as u64
    } else {
        period - prev_raw as u64 + curr_raw as u64
    }
}

#[derive(Debug, Clone, Copy)]
struct OverflowState {
    last_raw: u32,
    overflows: u64,
}

/// Overflow-tracking timebase shared by all motors
pub struct Timebase<C> {
    counter: C,
    period: u64,
    tick_hz: u32,
    state: CriticalSectionMutex<Cell<OverflowState>>,
}

impl<C: FreeRunningCounter> Timebase<C> {
    /// Start tracking a running counter
    ///
    /// Time zero is the counter's zero before the first sample, so the first
    /// [`now`](Self::now) equals the current raw count.
    pub fn new(counter: C) -> Self {
        let period = counter.period();
        let tick_hz = counter.tick_hz();
        let last_raw = counter.read_raw_count();

        Self {
            counter,
            period,
            tick_hz,
            state: CriticalSectionMutex::new(Cell::new(OverflowState {
                last_raw,
                overflows: 0,
            })),
        }
    }

    /// Current absolute time
    ///
    /// Never decreases, provided the polling obligation in the module
    /// documentation holds.
    pub fn now(&self) -> AbsoluteTime {
        self.state.lock(|cell| {
            let mut state = cell.get();
            let raw = self.counter.read_raw_count();

            if raw < state.last_raw {
                state.overflows += 1;
            }
            state.last_raw = raw;
            cell.set(state);

            AbsoluteTime(state.overflows * self.period + raw as u64)
        })
    }

    /// Time passed since `since`
    pub fn elapsed(&self, since: AbsoluteTime) -> TickSpan {
        TickSpan::new(self.now().saturating_ticks_since(since), self.tick_hz)
    }

    /// Tick frequency in Hz
    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    /// Number of hardware overflows seen so far
    pub fn overflows(&self) -> u64 {
        self.state.lock(|cell| cell.get().overflows)
    }
}
