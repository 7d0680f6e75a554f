//! Board-agnostic velocity control core for four DC gearmotors
//!
//! This crate contains all control logic that does not depend on a
//! specific microcontroller:
//!
//! - Overflow-safe shared timebase
//! - Quadrature encoder tracking
//! - Velocity and position estimation
//! - PID velocity control with setpoint ramp and timeout
//! - Motor actuator trait
//! - Per-motor control channels and cross-task handoff
//! - Board constants, motor bindings and configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod control;
pub mod encoder;
pub mod motion;
pub mod motor;
pub mod timebase;
pub mod traits;
