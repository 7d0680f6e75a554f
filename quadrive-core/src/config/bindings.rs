//! Board hardware bindings
//!
//! One binding per physical motor: which timers and pins it uses and which
//! way it turns for a positive command. The identifiers are descriptive; the
//! firmware wires the matching typed peripherals.

use heapless::FnvIndexSet;

use super::constants::MOTOR_COUNT;
use super::types::{ConfigError, Direction};

/// A GPIO pin identifier such as `PE9`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    /// Port letter (`'A'..='I'`)
    pub port: char,
    /// Pin number within the port (0-15)
    pub num: u8,
}

/// Error parsing a pin string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinParseError {
    /// Missing the leading `P`
    MissingPrefix,
    /// Port letter outside `A..=I`
    InvalidPort,
    /// Pin number missing or above 15
    InvalidPin,
}

impl PinId {
    pub const fn new(port: char, num: u8) -> Self {
        Self { port, num }
    }

    /// Parse a pin string
    ///
    /// Supports formats:
    /// - "PA0" -> Port A, Pin 0
    /// - "pe12" -> Port E, Pin 12
    pub fn parse(s: &str) -> Result<Self, PinParseError> {
        let s = s.trim();
        let mut chars = s.chars();

        match chars.next() {
            Some('P') | Some('p') => {}
            _ => return Err(PinParseError::MissingPrefix),
        }

        let port = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .ok_or(PinParseError::InvalidPort)?;
        if !('A'..='I').contains(&port) {
            return Err(PinParseError::InvalidPort);
        }

        let num: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| PinParseError::InvalidPin)?;
        if num > 15 {
            return Err(PinParseError::InvalidPin);
        }

        Ok(Self { port, num })
    }
}

/// Hardware timer identifier (`TIMn`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub u8);

/// Fixed hardware binding of one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorBinding {
    /// Motor label ("M1".."M4")
    pub name: &'static str,
    /// Timer running in encoder mode
    pub enc_timer: TimerId,
    /// Encoder phase A input
    pub enc_a: PinId,
    /// Encoder phase B input
    pub enc_b: PinId,
    /// Timer generating the PWM
    pub pwm_timer: TimerId,
    /// PWM output pin
    pub pwm_pin: PinId,
    /// PWM timer channel (1-4)
    pub pwm_channel: u8,
    /// H-bridge input A
    pub in_a: PinId,
    /// H-bridge input B
    pub in_b: PinId,
    /// Current-limit select
    pub ilim: PinId,
    /// Rotation produced by a positive command
    pub default_dir: Direction,
}

impl MotorBinding {
    /// All pins this binding uses
    pub fn pins(&self) -> [PinId; 6] {
        [
            self.enc_a,
            self.enc_b,
            self.pwm_pin,
            self.in_a,
            self.in_b,
            self.ilim,
        ]
    }

    /// Both timers this binding uses
    pub fn timers(&self) -> [TimerId; 2] {
        [self.enc_timer, self.pwm_timer]
    }
}

/// Timer used as the shared timebase
pub const TIMEBASE_TIMER: TimerId = TimerId(6);

/// Motor bindings of the drive board
pub const MOTOR_BINDINGS: [MotorBinding; MOTOR_COUNT] = [
    MotorBinding {
        name: "M1",
        enc_timer: TimerId(1),
        enc_a: PinId::new('E', 9),
        enc_b: PinId::new('E', 11),
        pwm_timer: TimerId(10),
        pwm_pin: PinId::new('F', 6),
        pwm_channel: 1,
        in_a: PinId::new('E', 12),
        in_b: PinId::new('E', 13),
        ilim: PinId::new('E', 10),
        default_dir: Direction::from_sign(-1),
    },
    MotorBinding {
        name: "M2",
        enc_timer: TimerId(2),
        enc_a: PinId::new('A', 15),
        enc_b: PinId::new('B', 3),
        pwm_timer: TimerId(11),
        pwm_pin: PinId::new('F', 7),
        pwm_channel: 1,
        in_a: PinId::new('G', 11),
        in_b: PinId::new('G', 12),
        ilim: PinId::new('G', 15),
        default_dir: Direction::from_sign(1),
    },
    MotorBinding {
        name: "M3",
        enc_timer: TimerId(3),
        enc_a: PinId::new('C', 6),
        enc_b: PinId::new('C', 7),
        pwm_timer: TimerId(13),
        pwm_pin: PinId::new('F', 8),
        pwm_channel: 1,
        in_a: PinId::new('G', 5),
        in_b: PinId::new('G', 6),
        ilim: PinId::new('G', 7),
        default_dir: Direction::from_sign(-1),
    },
    MotorBinding {
        name: "M4",
        enc_timer: TimerId(4),
        enc_a: PinId::new('D', 12),
        enc_b: PinId::new('D', 13),
        pwm_timer: TimerId(14),
        pwm_pin: PinId::new('F', 9),
        pwm_channel: 1,
        in_a: PinId::new('D', 10),
        in_b: PinId::new('D', 11),
        ilim: PinId::new('D', 14),
        default_dir: Direction::from_sign(1),
    },
];

/// Check that no pin or timer is claimed by two bindings
///
/// The timebase timer counts as claimed.
pub fn validate_bindings(bindings: &[MotorBinding]) -> Result<(), ConfigError> {
    if bindings.len() > MOTOR_COUNT {
        return Err(ConfigError::TooManyMotors);
    }

    let mut pins: FnvIndexSet<PinId, 32> = FnvIndexSet::new();
    let mut timers: FnvIndexSet<TimerId, 16> = FnvIndexSet::new();
    timers
        .insert(TIMEBASE_TIMER)
        .map_err(|_| ConfigError::TooManyMotors)?;

    for binding in bindings {
        for pin in binding.pins() {
            let fresh = pins.insert(pin).map_err(|_| ConfigError::TooManyMotors)?;
            if !fresh {
                return Err(ConfigError::PinConflict);
            }
        }
        for timer in binding.timers() {
            let fresh = timers
                .insert(timer)
                .map_err(|_| ConfigError::TooManyMotors)?;
            if !fresh {
                return Err(ConfigError::PinConflict);
            }
        }
    }

    Ok(())
}
