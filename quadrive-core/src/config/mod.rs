//! Configuration
//!
//! Board constants, fixed motor bindings and the runtime configuration
//! structures of the control pipeline.

pub mod bindings;
pub mod constants;
pub mod types;

pub use bindings::*;
pub use constants::*;
pub use types::*;
