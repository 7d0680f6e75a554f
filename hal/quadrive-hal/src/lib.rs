//! Quadrive Hardware Abstraction Layer
//!
//! This crate defines the small set of hardware capabilities the motor
//! control core needs. Chip-specific crates implement them on top of real
//! peripherals, and tests implement them with fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  quadrive-firmware                      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────┐  ┌──────────────────┐
//! │  quadrive-core       │  │ quadrive-drivers │
//! └──────────────────────┘  └──────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  quadrive-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  quadrive-hal-stm32f4                   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Direction and current-limit outputs
//! - [`counter::FreeRunningCounter`] - Timebase timer
//! - [`counter::QuadratureCounter`] - Encoder-mode timer
//! - [`pwm::PwmChannel`] - Motor PWM output
//!
//! The `mock` feature adds in-memory implementations for host tests.

#![no_std]
#![deny(unsafe_code)]

pub mod counter;
pub mod gpio;
#[cfg(feature = "mock")]
pub mod mock;
pub mod pwm;

pub use counter::{FreeRunningCounter, QuadratureCounter};
pub use gpio::OutputPin;
pub use pwm::PwmChannel;
