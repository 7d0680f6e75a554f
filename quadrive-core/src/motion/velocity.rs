//! Velocity and position estimation
//!
//! Differentiates the encoder tracker's cumulative count over the time
//! measured by the shared timebase. The estimator only reads tick totals;
//! the tracker stays the single owner of the encoder state.

use core::f64::consts::TAU;

use quadrive_hal::FreeRunningCounter;

use crate::config::{AngleWrap, EstimatorConfig};
use crate::timebase::{AbsoluteTime, Timebase};

/// Per-motor velocity state
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    config: EstimatorConfig,
    /// Latest velocity estimate (rad/s)
    velocity: f64,
    /// Accumulated output shaft angle (rad)
    position: f64,
    /// Position step of the last accepted update (rad)
    last_step: f64,
    /// Tick total at the last accepted update
    prev_ticks: i64,
    /// Timestamp of the last accepted update
    prev_time: AbsoluteTime,
}

impl VelocityEstimator {
    /// Create an estimator whose baseline is `ticks` at `start`
    pub fn new(config: EstimatorConfig, ticks: i64, start: AbsoluteTime) -> Self {
        Self {
            config,
            velocity: 0.0,
            position: 0.0,
            last_step: 0.0,
            prev_ticks: ticks,
            prev_time: start,
        }
    }

    /// Update from the tracker's tick total, timing with `timebase`
    ///
    /// Returns the new velocity estimate.
    pub fn update<C: FreeRunningCounter>(&mut self, ticks: i64, timebase: &Timebase<C>) -> f64 {
        let now = timebase.now();
        self.update_at(ticks, now, timebase.tick_hz())
    }

    /// Update from a tick total sampled at `now`
    ///
    /// If no time has passed since the last accepted update the previous
    /// velocity is returned and nothing is consumed: the ticks are picked
    /// up by the next update with a non-zero interval.
    pub fn update_at(&mut self, ticks: i64, now: AbsoluteTime, tick_hz: u32) -> f64 {
        let elapsed_ticks = now.saturating_ticks_since(self.prev_time);
        if elapsed_ticks == 0 || tick_hz == 0 {
            return self.velocity;
        }

        let dt = elapsed_ticks as f64 / tick_hz as f64;
        let step = (ticks - self.prev_ticks) as f64 / self.config.imp_per_rad;

        self.velocity = step / dt;
        self.position += step;
        self.last_step = step;
        self.prev_ticks = ticks;
        self.prev_time = now;

        self.velocity
    }

    /// Latest velocity estimate in rad/s
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Accumulated output shaft angle in rad
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Position change applied by the last accepted update, in rad
    pub fn last_step(&self) -> f64 {
        self.last_step
    }

    /// Wheel angle in rad
    ///
    /// The output shaft position scaled by the wheel ratio, wrapped into
    /// `[0, 2π)` or left unbounded depending on configuration.
    pub fn wheel_angle(&self) -> f64 {
        let angle = self.position * self.config.wheel_ratio;
        match self.config.wheel_wrap {
            AngleWrap::Unbounded => angle,
            AngleWrap::Wrapped => wrap_angle(angle),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}

/// Wrap an angle into `[0, 2π)`
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = libm::fmod(angle, TAU);
    let wrapped = if wrapped < 0.0 { wrapped + TAU } else { wrapped };
    // fmod of a tiny negative value plus TAU can round up to TAU itself
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENC_MAX_CNT, IMP_PER_RAD, TIMEBASE_TIMER_FREQ};
    use crate::encoder::EncoderTracker;
    use crate::config::EncoderConfig;
    use core::f64::consts::PI;
    use proptest::prelude::*;
    use quadrive_hal::mock::{MockClock, MockQuadrature, MockShaft};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_velocity_from_ticks() {
        let mut est = VelocityEstimator::new(EstimatorConfig::default(), 0, AbsoluteTime::ZERO);

        // One output revolution in one second
        let ticks = (IMP_PER_RAD * 2.0 * PI).round() as i64;
        let v = est.update_at(ticks, AbsoluteTime::from_ticks(10_000), 10_000);

        assert!(close(v, 2.0 * PI));
        assert!(close(est.position(), 2.0 * PI));
    }

    #[test]
    fn test_zero_time_holds_velocity() {
        let mut est = VelocityEstimator::new(EstimatorConfig::default(), 0, AbsoluteTime::ZERO);
        let t1 = AbsoluteTime::from_ticks(100);
        let v1 = est.update_at(509, t1, 10_000);

        // Same timestamp again, with new ticks: no division, nothing consumed
        let v2 = est.update_at(900, t1, 10_000);
        assert_eq!(v1, v2);
        assert!(close(est.position(), 509.0 / IMP_PER_RAD));

        // The held-back ticks arrive with the next real interval
        est.update_at(900, AbsoluteTime::from_ticks(200), 10_000);
        assert!(close(est.position(), 900.0 / IMP_PER_RAD));
    }

    #[test]
    fn test_negative_velocity() {
        let mut est = VelocityEstimator::new(EstimatorConfig::default(), 0, AbsoluteTime::ZERO);
        let v = est.update_at(-1000, AbsoluteTime::from_ticks(5_000), 10_000);
        assert!(close(v, -2000.0 / IMP_PER_RAD));
    }

    #[test]
    fn test_update_with_timebase() {
        let clock = MockClock::new(0xFFFF, TIMEBASE_TIMER_FREQ);
        clock.set(0xFF00);
        let timebase = Timebase::new(&clock);
        let mut est = VelocityEstimator::new(EstimatorConfig::default(), 0, timebase.now());

        // 0x200 ticks later, across the timer overflow
        clock.advance(0x200);
        let v = est.update(1024, &timebase);
        let dt = 512.0 / TIMEBASE_TIMER_FREQ as f64;
        assert!(close(v, 1024.0 / IMP_PER_RAD / dt));
    }

    #[test]
    fn test_wheel_angle_wrapped() {
        let mut est = VelocityEstimator::new(EstimatorConfig::default(), 0, AbsoluteTime::ZERO);
        let ticks = (IMP_PER_RAD * 2.5 * PI) as i64;
        est.update_at(ticks, AbsoluteTime::from_ticks(1), 10_000);

        let expected = ticks as f64 / IMP_PER_RAD - 2.0 * PI;
        assert!(close(est.wheel_angle(), expected));

        est.update_at(-ticks, AbsoluteTime::from_ticks(2), 10_000);
        let angle = est.wheel_angle();
        assert!((0.0..2.0 * PI).contains(&angle));
        assert!(close(angle, 2.0 * PI - expected));
    }

    #[test]
    fn test_wheel_angle_unbounded() {
        let config = EstimatorConfig {
            wheel_wrap: AngleWrap::Unbounded,
            wheel_ratio: 0.5,
            ..Default::default()
        };
        let mut est = VelocityEstimator::new(config, 0, AbsoluteTime::ZERO);
        let ticks = (IMP_PER_RAD * 10.0 * PI) as i64;
        est.update_at(ticks, AbsoluteTime::from_ticks(1), 10_000);

        assert!(close(est.wheel_angle(), 0.5 * ticks as f64 / IMP_PER_RAD));
        assert!(est.wheel_angle() > 2.0 * PI);
    }

    #[test]
    fn test_wrap_angle_edges() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!(close(wrap_angle(2.0 * PI), 0.0));
        assert!(close(wrap_angle(-PI / 2.0), 1.5 * PI));
        assert!(wrap_angle(-1e-18) < 2.0 * PI);
    }

    proptest! {
        #[test]
        fn prop_position_round_trip(steps in proptest::collection::vec(-9000i64..9000, 1..300)) {
            let shaft = MockShaft::new();
            let counter = MockQuadrature::new(&shaft, ENC_MAX_CNT);
            let mut tracker = EncoderTracker::new(counter, EncoderConfig::default());
            let initial = tracker.cumulative();
            let mut est = VelocityEstimator::new(EstimatorConfig::default(), initial, AbsoluteTime::ZERO);

            let mut summed = 0.0;
            for (i, step) in steps.iter().enumerate() {
                shaft.rotate(*step);
                let ticks = tracker.update();
                est.update_at(ticks, AbsoluteTime::from_ticks(33 * (i as u64 + 1)), 10_000);
                summed += est.last_step();
            }

            let expected = (tracker.cumulative() - initial) as f64 / IMP_PER_RAD;
            prop_assert!((summed - expected).abs() < 1e-6);
            prop_assert!((est.position() - expected).abs() < 1e-6);
        }
    }
}
