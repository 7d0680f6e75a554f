//! Quadrive - Four-motor velocity controller firmware
//!
//! Main firmware binary for the STM32F407 drive board. Each of the four
//! gearmotors gets a quadrature encoder timer, a single-channel PWM timer
//! and three H-bridge control pins. A basic timer provides the shared
//! timebase used for velocity estimation.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::time::Hertz;
use embassy_stm32::Config;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use quadrive_core::config::{
    validate_bindings, MOTORS_PWM_FREQUENCY, MOTOR_BINDINGS, TIMEBASE_TIMER_FREQ,
    TIMEBASE_TIMER_OVERFLOW_VALUE,
};
use quadrive_core::timebase::Timebase;
use quadrive_hal_stm32f4::{QeiCounter, TimebaseCounter, TimerPwm};

mod channels;
mod tasks;

use tasks::SharedTimebase;

// Shared by all motor tasks for the lifetime of the program
static TIMEBASE: StaticCell<SharedTimebase> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Quadrive firmware starting...");

    let p = embassy_stm32::init(clock_config());
    info!("Peripherals initialized");

    if let Err(e) = validate_bindings(&MOTOR_BINDINGS) {
        defmt::panic!("Invalid motor bindings: {}", e);
    }

    let counter = TimebaseCounter::new(
        p.TIM6,
        Hertz(TIMEBASE_TIMER_FREQ),
        TIMEBASE_TIMER_OVERFLOW_VALUE as u16,
    );
    let timebase: &'static SharedTimebase = TIMEBASE.init(Timebase::new(counter));
    info!("Timebase running at {} Hz", timebase.tick_hz());

    let pwm_freq = Hertz(MOTORS_PWM_FREQUENCY);

    // M1: TIM1 encoder on PE9/PE11, TIM10 PWM on PF6
    let motor1 = tasks::motor::build(
        0,
        QeiCounter::new(p.TIM1, p.PE9, p.PE11),
        TimerPwm::new(p.TIM10, p.PF6, pwm_freq),
        Output::new(p.PE12, Level::Low, Speed::Low),
        Output::new(p.PE13, Level::Low, Speed::Low),
        Output::new(p.PE10, Level::Low, Speed::Low),
        timebase,
    );

    // M2: TIM2 encoder on PA15/PB3, TIM11 PWM on PF7
    let motor2 = tasks::motor::build(
        1,
        QeiCounter::new(p.TIM2, p.PA15, p.PB3),
        TimerPwm::new(p.TIM11, p.PF7, pwm_freq),
        Output::new(p.PG11, Level::Low, Speed::Low),
        Output::new(p.PG12, Level::Low, Speed::Low),
        Output::new(p.PG15, Level::Low, Speed::Low),
        timebase,
    );

    // M3: TIM3 encoder on PC6/PC7, TIM13 PWM on PF8
    let motor3 = tasks::motor::build(
        2,
        QeiCounter::new(p.TIM3, p.PC6, p.PC7),
        TimerPwm::new(p.TIM13, p.PF8, pwm_freq),
        Output::new(p.PG5, Level::Low, Speed::Low),
        Output::new(p.PG6, Level::Low, Speed::Low),
        Output::new(p.PG7, Level::Low, Speed::Low),
        timebase,
    );

    // M4: TIM4 encoder on PD12/PD13, TIM14 PWM on PF9
    let motor4 = tasks::motor::build(
        3,
        QeiCounter::new(p.TIM4, p.PD12, p.PD13),
        TimerPwm::new(p.TIM14, p.PF9, pwm_freq),
        Output::new(p.PD10, Level::Low, Speed::Low),
        Output::new(p.PD11, Level::Low, Speed::Low),
        Output::new(p.PD14, Level::Low, Speed::Low),
        timebase,
    );
    info!("Motor channels initialized");

    spawner.spawn(tasks::motor1_task(motor1)).unwrap();
    spawner.spawn(tasks::motor2_task(motor2)).unwrap();
    spawner.spawn(tasks::motor3_task(motor3)).unwrap();
    spawner.spawn(tasks::motor4_task(motor4)).unwrap();
    spawner.spawn(tasks::telemetry_task()).unwrap();

    info!("All tasks spawned, firmware running");
}

/// 168 MHz system clock from the 8 MHz crystal
///
/// APB1 timers run at 84 MHz and APB2 timers at 168 MHz.
fn clock_config() -> Config {
    use embassy_stm32::rcc::*;

    let mut config = Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(8_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL168,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV7),
        divr: None,
    });
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV4;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.sys = Sysclk::PLL1_P;
    config
}
