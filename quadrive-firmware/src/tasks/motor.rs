//! Motor control tasks
//!
//! Every motor is stepped by its own ticker at the control frequency. The
//! channels differ only in their timer types, so each gets a thin task
//! wrapper around the shared loop.

use defmt::*;
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{TIM1, TIM10, TIM11, TIM13, TIM14, TIM2, TIM3, TIM4, TIM6};
use embassy_time::{Duration, Ticker};

use embassy_stm32::timer::{GeneralInstance1Channel, GeneralInstance4Channel};
use quadrive_core::config::{MotorConfig, MOTOR_BINDINGS, PID_FREQ};
use quadrive_core::motor::MotorChannel;
use quadrive_core::timebase::Timebase;
use quadrive_core::traits::MotorActuator;
use quadrive_drivers::compat::HalOutputPin;
use quadrive_drivers::motor::{HBridgeConfig, HBridgeMotor};
use quadrive_hal::{FreeRunningCounter, QuadratureCounter};
use quadrive_hal_stm32f4::{QeiCounter, TimebaseCounter, TimerPwm};

/// Timebase shared by all motor tasks
pub type SharedTimebase = Timebase<TimebaseCounter<'static, TIM6>>;

type Pin = HalOutputPin<Output<'static>>;
type Bridge<T> = HBridgeMotor<TimerPwm<'static, T>, Pin, Pin, Pin>;
type Channel<E, P> = MotorChannel<'static, QeiCounter<'static, E>, TimebaseCounter<'static, TIM6>, Bridge<P>>;

pub type Motor1 = Channel<TIM1, TIM10>;
pub type Motor2 = Channel<TIM2, TIM11>;
pub type Motor3 = Channel<TIM3, TIM13>;
pub type Motor4 = Channel<TIM4, TIM14>;

use crate::channels::MOTOR_LINKS;

/// Assemble the channel for `MOTOR_BINDINGS[index]` from its peripherals
pub fn build<E, P>(
    index: usize,
    counter: QeiCounter<'static, E>,
    pwm: TimerPwm<'static, P>,
    in_a: Output<'static>,
    in_b: Output<'static>,
    ilim: Output<'static>,
    timebase: &'static SharedTimebase,
) -> Channel<E, P>
where
    E: GeneralInstance4Channel,
    P: GeneralInstance1Channel,
{
    let binding = &MOTOR_BINDINGS[index];
    let config = MotorConfig::for_binding(binding);
    let bridge = HBridgeMotor::new(
        pwm,
        HalOutputPin::new(in_a),
        HalOutputPin::new(in_b),
        HalOutputPin::new(ilim),
        HBridgeConfig::from(&config),
    );

    info!(
        "{}: encoder TIM{}, PWM TIM{}, default dir {}",
        binding.name, binding.enc_timer.0, binding.pwm_timer.0, binding.default_dir
    );

    unwrap!(MotorChannel::new(
        binding.name,
        config,
        counter,
        bridge,
        timebase,
        &MOTOR_LINKS[index],
    ))
}

async fn run<Q, C, A>(mut channel: MotorChannel<'static, Q, C, A>)
where
    Q: QuadratureCounter,
    C: FreeRunningCounter,
    A: MotorActuator,
{
    info!("{}: control loop started at {} Hz", channel.name(), PID_FREQ);

    let mut ticker = Ticker::every(Duration::from_hz(PID_FREQ as u64));
    let mut stale = true;

    loop {
        ticker.next().await;

        let status = channel.handler();
        if status.stale != stale {
            if status.stale {
                warn!("{}: setpoint timed out, motor stopped", channel.name());
            } else {
                info!("{}: setpoint received", channel.name());
            }
            stale = status.stale;
        }
    }
}

#[embassy_executor::task]
pub async fn motor1_task(channel: Motor1) {
    run(channel).await
}

#[embassy_executor::task]
pub async fn motor2_task(channel: Motor2) {
    run(channel).await
}

#[embassy_executor::task]
pub async fn motor3_task(channel: Motor3) {
    run(channel).await
}

#[embassy_executor::task]
pub async fn motor4_task(channel: Motor4) {
    run(channel).await
}
