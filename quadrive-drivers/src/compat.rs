//! `embedded-hal` adapters
//!
//! Wrap pins and PWM channels from any `embedded-hal` 1.0 HAL so they can
//! drive an [`HBridgeMotor`](crate::motor::HBridgeMotor). Only infallible
//! peripherals are accepted: a GPIO or compare-register write that can fail
//! has no sensible recovery inside a control period.

use core::convert::Infallible;

use embedded_hal::digital;
use embedded_hal::pwm::SetDutyCycle;
use quadrive_hal::{OutputPin, PwmChannel};

/// Output pin from an `embedded-hal` digital output
///
/// The level is tracked locally so reading it back needs no access to the
/// port's output data register.
pub struct HalOutputPin<P> {
    pin: P,
    high: bool,
}

impl<P> HalOutputPin<P>
where
    P: digital::OutputPin<Error = Infallible>,
{
    /// Wrap a pin, driving it low
    pub fn new(pin: P) -> Self {
        let mut wrapped = Self { pin, high: true };
        wrapped.set_low();
        wrapped
    }

    /// Unwrap the inner pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> OutputPin for HalOutputPin<P>
where
    P: digital::OutputPin<Error = Infallible>,
{
    fn set_high(&mut self) {
        match self.pin.set_high() {
            Ok(()) => self.high = true,
            Err(e) => match e {},
        }
    }

    fn set_low(&mut self) {
        match self.pin.set_low() {
            Ok(()) => self.high = false,
            Err(e) => match e {},
        }
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// PWM channel from an `embedded-hal` duty-cycle output
pub struct HalPwmChannel<P> {
    pwm: P,
    duty: u16,
}

impl<P> HalPwmChannel<P>
where
    P: SetDutyCycle<Error = Infallible>,
{
    /// Wrap a channel, setting it fully off
    pub fn new(pwm: P) -> Self {
        let mut wrapped = Self { pwm, duty: 0 };
        wrapped.set_duty(0);
        wrapped
    }

    pub fn into_inner(self) -> P {
        self.pwm
    }
}

impl<P> PwmChannel for HalPwmChannel<P>
where
    P: SetDutyCycle<Error = Infallible>,
{
    fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(self.pwm.max_duty_cycle());
        match self.pwm.set_duty_cycle(duty) {
            Ok(()) => self.duty = duty,
            Err(e) => match e {},
        }
    }

    fn max_duty(&self) -> u16 {
        self.pwm.max_duty_cycle()
    }

    fn duty(&self) -> u16 {
        self.duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePin {
        level: bool,
    }

    impl digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl digital::OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.level = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.level = true;
            Ok(())
        }
    }

    struct FakePwm {
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for FakePwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            999
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            Ok(())
        }
    }

    #[test]
    fn test_pin_starts_low() {
        let pin = HalOutputPin::new(FakePin { level: true });
        assert!(pin.is_set_low());
        assert!(!pin.into_inner().level);
    }

    #[test]
    fn test_pin_tracks_level() {
        let mut pin = HalOutputPin::new(FakePin { level: false });
        pin.set_state(true);
        assert!(pin.is_set_high());
        assert!(pin.pin.level);
    }

    #[test]
    fn test_pwm_clamps_to_max() {
        let mut pwm = HalPwmChannel::new(FakePwm { duty: 500 });
        assert_eq!(pwm.duty(), 0);

        pwm.set_duty(5000);
        assert_eq!(pwm.duty(), 999);
        assert_eq!(pwm.into_inner().duty, 999);
    }
}
