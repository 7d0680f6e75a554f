//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in quadrive-core:
//!
//! - H-bridge DC motor actuator with soft and emergency stop
//! - Adapters from `embedded-hal` pins and PWM channels to the
//!   `quadrive-hal` traits

#![no_std]
#![deny(unsafe_code)]

pub mod compat;
pub mod motor;
