//! Free-running timebase counter
//!
//! A basic timer counting up at a fixed tick rate with the full 16-bit
//! auto-reload. It never interrupts; overflow is recovered in software by
//! `quadrive_core::timebase::Timebase`.

use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::Timer;
use embassy_stm32::timer::BasicInstance;
use embassy_stm32::Peri;
use quadrive_hal::FreeRunningCounter;

/// Basic timer configured as a free-running up-counter
pub struct TimebaseCounter<'d, T: BasicInstance> {
    timer: Timer<'d, T>,
    tick_hz: u32,
    max_count: u16,
}

impl<'d, T: BasicInstance> TimebaseCounter<'d, T> {
    /// Start the timer counting at `tick_hz` with auto-reload `max_count`
    pub fn new(tim: Peri<'d, T>, tick_hz: Hertz, max_count: u16) -> Self {
        let timer = Timer::new(tim);
        let clock = timer.get_clock_frequency().0;
        let psc = (clock / tick_hz.0).saturating_sub(1).min(u16::MAX as u32) as u16;

        let regs = timer.regs_core();
        regs.cr1().modify(|w| w.set_cen(false));
        regs.psc().write_value(psc);
        regs.arr().write(|w| w.set_arr(max_count));
        // Load the prescaler now instead of at the first overflow
        regs.egr().write(|w| w.set_ug(true));
        regs.cnt().write(|w| w.set_cnt(0));
        regs.cr1().modify(|w| w.set_cen(true));

        #[cfg(feature = "defmt")]
        defmt::info!(
            "timebase: clock {} Hz, psc {}, tick {} Hz",
            clock,
            psc,
            clock / (psc as u32 + 1)
        );

        Self {
            timer,
            tick_hz: clock / (psc as u32 + 1),
            max_count,
        }
    }
}

impl<T: BasicInstance> FreeRunningCounter for TimebaseCounter<'_, T> {
    fn read_raw_count(&self) -> u32 {
        self.timer.regs_core().cnt().read().cnt() as u32
    }

    fn max_count(&self) -> u32 {
        self.max_count as u32
    }

    fn tick_hz(&self) -> u32 {
        self.tick_hz
    }
}
