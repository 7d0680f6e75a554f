//! Hardware counter abstractions
//!
//! Two kinds of timer are used by the control core:
//!
//! - a free-running up-counter clocked at a fixed tick rate, shared by all
//!   motors as the timebase
//! - one quadrature (encoder mode) counter per motor

/// Free-running hardware up-counter
///
/// The counter counts from 0 to [`max_count`](Self::max_count) inclusive at
/// [`tick_hz`](Self::tick_hz) and then rolls over to 0.
///
/// Reads take `&self`: the timebase is shared between motor tasks and reading
/// a counter register has no side effects.
pub trait FreeRunningCounter {
    /// Read the current raw count (`0..=max_count()`)
    fn read_raw_count(&self) -> u32;

    /// Highest value the counter reaches before rolling over
    fn max_count(&self) -> u32;

    /// Counting frequency in Hz
    fn tick_hz(&self) -> u32;

    /// Number of ticks in one overflow period
    fn period(&self) -> u64 {
        self.max_count() as u64 + 1
    }
}

/// Quadrature encoder counter
///
/// Counts up or down with the encoder phases and wraps in both directions
/// at `max_count`.
pub trait QuadratureCounter {
    /// Read the current raw count
    fn read_raw_count(&mut self) -> u32;

    /// Load the counter with a value (used to centre it at startup)
    fn set_raw_count(&mut self, value: u32);
}

impl<T: FreeRunningCounter + ?Sized> FreeRunningCounter for &T {
    fn read_raw_count(&self) -> u32 {
        (**self).read_raw_count()
    }

    fn max_count(&self) -> u32 {
        (**self).max_count()
    }

    fn tick_hz(&self) -> u32 {
        (**self).tick_hz()
    }
}
