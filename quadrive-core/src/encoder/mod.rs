//! Encoder decoding

pub mod tracker;

pub use tracker::{wrap_delta, EncoderTracker};
