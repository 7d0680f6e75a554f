//! Single-channel PWM output
//!
//! The drive board feeds each H-bridge from channel 1 of a one-channel
//! timer (TIM10/11/13/14), which `SimplePwm` does not cover. The timer is
//! set up through the low-level driver and the output pin is switched to
//! its alternate function directly.

use embassy_stm32::gpio::Pin;
use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::{OutputCompareMode, Timer};
use embassy_stm32::timer::{Ch1, Channel, GeneralInstance1Channel, TimerPin};
use embassy_stm32::Peri;
use quadrive_hal::PwmChannel;

/// Channel 1 of a general-purpose timer in edge-aligned PWM mode 1
pub struct TimerPwm<'d, T: GeneralInstance1Channel> {
    timer: Timer<'d, T>,
    max_duty: u16,
    duty: u16,
}

impl<'d, T: GeneralInstance1Channel> TimerPwm<'d, T> {
    /// Configure the timer at `freq` with the output off
    pub fn new(tim: Peri<'d, T>, pin: Peri<'d, impl TimerPin<T, Ch1>>, freq: Hertz) -> Self {
        set_alternate_function(pin.port(), pin.pin(), pin.af_num());

        let mut timer = Timer::new(tim);
        timer.set_frequency(freq);
        timer.set_output_compare_mode(Channel::Ch1, OutputCompareMode::PwmMode1);
        timer.set_output_compare_preload(Channel::Ch1, true);
        timer.set_compare_value(Channel::Ch1, 0u16.into());
        timer.enable_channel(Channel::Ch1, true);
        timer.start();

        let max_duty = u16::try_from(timer.get_max_compare_value()).unwrap_or(u16::MAX);

        Self {
            timer,
            max_duty,
            duty: 0,
        }
    }
}

impl<T: GeneralInstance1Channel> PwmChannel for TimerPwm<'_, T> {
    fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(self.max_duty);
        self.timer.set_compare_value(Channel::Ch1, duty.into());
        self.duty = duty;
    }

    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn duty(&self) -> u16 {
        self.duty
    }
}

/// Switch a pin to a push-pull alternate function output
fn set_alternate_function(port: u8, pin: u8, af: u8) {
    let gpio = match port {
        0 => pac::GPIOA,
        1 => pac::GPIOB,
        2 => pac::GPIOC,
        3 => pac::GPIOD,
        4 => pac::GPIOE,
        5 => pac::GPIOF,
        6 => pac::GPIOG,
        7 => pac::GPIOH,
        _ => pac::GPIOI,
    };
    let n = pin as usize;

    gpio.afr(n / 8).modify(|w| w.set_afr(n % 8, af));
    gpio.otyper().modify(|w| w.set_ot(n, vals::Ot::PUSHPULL));
    gpio.ospeedr()
        .modify(|w| w.set_ospeedr(n, vals::Ospeedr::VERYHIGHSPEED));
    gpio.moder().modify(|w| w.set_moder(n, vals::Moder::ALTERNATE));
}
