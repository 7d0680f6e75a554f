//! STM32F4-specific HAL for the Quadrive motor controller
//!
//! Implements the `quadrive-hal` counter and PWM traits on top of
//! embassy-stm32 timers:
//!
//! - [`QeiCounter`]: timer in encoder mode (TIM1..TIM4)
//! - [`TimebaseCounter`]: free-running basic timer (TIM6)
//! - [`TimerPwm`]: single-channel PWM (TIM10, TIM11, TIM13, TIM14)
//!
//! # Features
//!
//! - `stm32f407zg` - Enable support for STM32F407ZG (drive board MCU)
//! - `defmt` - Enable debug formatting support
//!
//! H-bridge direction and current-limit pins are plain embassy `Output`s,
//! wrapped with `quadrive_drivers::compat::HalOutputPin`.

#![no_std]

pub mod encoder;
pub mod pwm;
pub mod timebase;

pub use encoder::QeiCounter;
pub use pwm::TimerPwm;
pub use timebase::TimebaseCounter;
