//! Quadrature encoder counter
//!
//! The QEI driver exposes the counter read-only, so presetting is done in
//! software with a wrapping bias over the 16-bit hardware count.

use embassy_stm32::timer::qei::{Ch1, Ch2, Qei, QeiPin};
use embassy_stm32::timer::{GeneralInstance4Channel, TimerPin};
use embassy_stm32::Peri;
use quadrive_hal::QuadratureCounter;

/// Timer in encoder mode counting both edges of both phases
pub struct QeiCounter<'d, T: GeneralInstance4Channel> {
    qei: Qei<'d, T>,
    bias: u16,
}

impl<'d, T: GeneralInstance4Channel> QeiCounter<'d, T> {
    pub fn new(
        tim: Peri<'d, T>,
        phase_a: Peri<'d, impl TimerPin<T, Ch1>>,
        phase_b: Peri<'d, impl TimerPin<T, Ch2>>,
    ) -> Self {
        let qei = Qei::new(tim, QeiPin::new(phase_a), QeiPin::new(phase_b));
        Self { qei, bias: 0 }
    }
}

impl<T: GeneralInstance4Channel> QuadratureCounter for QeiCounter<'_, T> {
    fn read_raw_count(&mut self) -> u32 {
        self.qei.count().wrapping_add(self.bias) as u32
    }

    fn set_raw_count(&mut self, value: u32) {
        self.bias = (value as u16).wrapping_sub(self.qei.count());
    }
}
