//! Quadrature encoder tracker
//!
//! Turns a wrapping 16-bit encoder-mode counter into an unbounded signed
//! tick count.
//!
//! The hardware counter is preset to the midpoint of its range so the
//! first reads after startup are near the centre regardless of direction.
//! Between two updates a raw step of more than half the range cannot be
//! genuine motion at any reachable speed, so it is taken to be a rollover
//! and folded back into the minimal signed step.

use quadrive_hal::QuadratureCounter;

use crate::config::EncoderConfig;

/// Minimal signed step between two raw samples of a wrapping counter
///
/// Steps larger than half the range are folded by one full range, opposite
/// to the sign of the raw step. Exactly half the range is left unfolded.
pub const fn wrap_delta(prev_raw: u32, curr_raw: u32, range: u32) -> i64 {
    let half = (range / 2) as i64;
    let raw = curr_raw as i64 - prev_raw as i64;

    if raw > half {
        raw - range as i64
    } else if raw < -half {
        raw + range as i64
    } else {
        raw
    }
}

/// Per-motor encoder state
pub struct EncoderTracker<Q> {
    counter: Q,
    config: EncoderConfig,
    /// Raw count at the previous update
    prev_raw: u32,
    /// Running tick total
    cumulative: i64,
    /// Corrected step of the most recent update
    last_delta: i64,
    /// Updates whose step exceeded `max_step`
    faults: u32,
}

impl<Q: QuadratureCounter> EncoderTracker<Q> {
    /// Take ownership of a counter and centre it at the configured offset
    pub fn new(mut counter: Q, config: EncoderConfig) -> Self {
        counter.set_raw_count(config.offset);

        Self {
            counter,
            config,
            prev_raw: config.offset,
            cumulative: 0,
            last_delta: 0,
            faults: 0,
        }
    }

    /// Sample the counter and fold the step into the running total
    ///
    /// Call once per control period. Returns the cumulative tick count.
    pub fn update(&mut self) -> i64 {
        let raw = self.counter.read_raw_count() % self.config.range;
        let mut delta = wrap_delta(self.prev_raw, raw, self.config.range);

        let limit = self.config.max_step as i64;
        if delta > limit || delta < -limit {
            self.faults = self.faults.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("encoder step {} exceeds limit {}, clamped", delta, limit);
            delta = delta.clamp(-limit, limit);
        }

        self.prev_raw = raw;
        self.last_delta = delta;
        self.cumulative += delta;
        self.cumulative
    }

    /// Running tick total as of the last update
    pub fn cumulative(&self) -> i64 {
        self.cumulative
    }

    /// Step applied by the last update
    pub fn last_delta(&self) -> i64 {
        self.last_delta
    }

    /// Raw count seen by the last update
    pub fn last_raw(&self) -> u32 {
        self.prev_raw
    }

    /// Number of implausible steps that were clamped
    pub fn fault_count(&self) -> u32 {
        self.faults
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Get access to the underlying counter
    pub fn counter(&self) -> &Q {
        &self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENC_CNT_OFFSET, ENC_MAX_CNT, ENC_RANGE};
    use proptest::prelude::*;
    use quadrive_hal::mock::{MockQuadrature, MockShaft};

    /// Counter whose raw value the test sets directly
    struct RawCounter {
        raw: u32,
    }

    impl QuadratureCounter for RawCounter {
        fn read_raw_count(&mut self) -> u32 {
            self.raw
        }

        fn set_raw_count(&mut self, value: u32) {
            self.raw = value;
        }
    }

    #[test]
    fn test_wrap_delta_across_zero() {
        assert_eq!(wrap_delta(5, 65530, 65536), -11);
        assert_eq!(wrap_delta(65530, 5, 65536), 11);
    }

    #[test]
    fn test_wrap_delta_small_steps_untouched() {
        assert_eq!(wrap_delta(100, 140, 65536), 40);
        assert_eq!(wrap_delta(140, 100, 65536), -40);
        assert_eq!(wrap_delta(0, 32768, 65536), 32768);
    }

    #[test]
    fn test_first_update_near_zero() {
        let counter = RawCounter { raw: 0 };
        let mut tracker = EncoderTracker::new(counter, EncoderConfig::default());

        // Counter was centred by the constructor
        assert_eq!(tracker.counter().raw, ENC_CNT_OFFSET);
        assert_eq!(tracker.update(), 0);
    }

    #[test]
    fn test_counts_through_rollover() {
        let shaft = MockShaft::new();
        let counter = MockQuadrature::new(&shaft, ENC_MAX_CNT);
        let mut tracker = EncoderTracker::new(counter, EncoderConfig::default());

        // 200 updates of +1000 counts go round the 16-bit counter three times
        for _ in 0..200 {
            shaft.rotate(1000);
            tracker.update();
        }
        assert_eq!(tracker.cumulative(), 200_000);

        for _ in 0..300 {
            shaft.rotate(-1000);
            tracker.update();
        }
        assert_eq!(tracker.cumulative(), -100_000);
        assert_eq!(tracker.fault_count(), 0);
    }

    #[test]
    fn test_implausible_step_is_clamped_and_counted() {
        let config = EncoderConfig {
            max_step: 100,
            ..Default::default()
        };
        let mut tracker = EncoderTracker::new(RawCounter { raw: 0 }, config);

        tracker.counter.raw = ENC_CNT_OFFSET + 5000;
        assert_eq!(tracker.update(), 100);
        assert_eq!(tracker.last_delta(), 100);
        assert_eq!(tracker.fault_count(), 1);

        // Next step is measured from the new raw position, not re-reported
        tracker.counter.raw = ENC_CNT_OFFSET + 5010;
        assert_eq!(tracker.update(), 110);
        assert_eq!(tracker.fault_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_wrap_delta_is_minimal(prev in 0u32..ENC_RANGE, curr in 0u32..ENC_RANGE) {
            let delta = wrap_delta(prev, curr, ENC_RANGE);
            let half = (ENC_RANGE / 2) as i64;

            prop_assert!(delta >= -half && delta <= half);
            let reconstructed = (prev as i64 + delta).rem_euclid(ENC_RANGE as i64);
            prop_assert_eq!(reconstructed, curr as i64);
        }

        #[test]
        fn prop_tracker_matches_shaft(steps in proptest::collection::vec(-8000i64..8000, 1..200)) {
            let shaft = MockShaft::new();
            let counter = MockQuadrature::new(&shaft, ENC_MAX_CNT);
            let mut tracker = EncoderTracker::new(counter, EncoderConfig::default());

            for step in steps {
                shaft.rotate(step);
                tracker.update();
            }
            prop_assert_eq!(tracker.cumulative(), shaft.ticks());
        }
    }
}
