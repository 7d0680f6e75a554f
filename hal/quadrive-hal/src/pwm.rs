//! PWM output abstraction

/// A single PWM output channel
///
/// The channel number and frequency are fixed when the adapter is built;
/// the control core only changes the compare value.
pub trait PwmChannel {
    /// Set the compare value, `0..=max_duty()`
    ///
    /// Values above `max_duty()` are clamped by the implementation.
    fn set_duty(&mut self, duty: u16);

    /// Compare value giving 100% duty (the timer overflow value)
    fn max_duty(&self) -> u16;

    /// Current compare value
    fn duty(&self) -> u16;
}
