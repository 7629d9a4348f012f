//! Stopwatch and timing buckets
//!
//! Every measured interval is charged to exactly one [`Bucket`]. The
//! stopwatch restarts the moment an interval is charged, so consecutive
//! intervals leave no gaps.

use std::time::Instant;

/// Clock ticks per second (ticks are nanoseconds)
pub const TICKS_PER_SECOND: u64 = 1_000_000_000;

/// Convert ticks to milliseconds
pub fn ticks_to_millis(ticks: u64) -> f64 {
    ticks as f64 * 1000.0 / TICKS_PER_SECOND as f64
}

/// Where an interval of execution time is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Construction and static init/cleanup
    Lifecycle,
    /// Per-invocation init/cleanup
    Fixture,
    /// Test method bodies
    Body,
}

/// Accumulated ticks per bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingBuckets {
    pub lifecycle: u64,
    pub fixture: u64,
    pub body: u64,
}

impl TimingBuckets {
    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Lifecycle => self.lifecycle,
            Bucket::Fixture => self.fixture,
            Bucket::Body => self.body,
        }
    }

    fn slot(&mut self, bucket: Bucket) -> &mut u64 {
        match bucket {
            Bucket::Lifecycle => &mut self.lifecycle,
            Bucket::Fixture => &mut self.fixture,
            Bucket::Body => &mut self.body,
        }
    }

    /// Sum of all three buckets
    pub fn total(&self) -> u64 {
        self.lifecycle + self.fixture + self.body
    }

    pub fn merge(&mut self, other: &TimingBuckets) {
        self.lifecycle += other.lifecycle;
        self.fixture += other.fixture;
        self.body += other.body;
    }
}

/// Monotonic tick source
pub trait Clock {
    /// Ticks elapsed since an arbitrary fixed origin
    fn now(&self) -> u64;
}

/// [`Clock`] backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Stopwatch charging consecutive intervals to buckets
#[derive(Debug)]
pub struct Stopwatch<C: Clock = MonotonicClock> {
    clock: C,
    started: u64,
}

impl Stopwatch<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for Stopwatch<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Stopwatch<C> {
    pub fn with_clock(clock: C) -> Self {
        let started = clock.now();
        Self { clock, started }
    }

    /// Start a fresh interval
    pub fn restart(&mut self) {
        self.started = self.clock.now();
    }

    /// Charge the current interval to `bucket` and start the next one
    pub fn add(&mut self, buckets: &mut TimingBuckets, bucket: Bucket) {
        let now = self.clock.now();
        *buckets.slot(bucket) += now.saturating_sub(self.started);
        self.started = now;
    }

    /// Drop the current interval without charging it
    pub fn discard(&mut self) {
        self.restart();
    }
}

#[cfg(test)]
pub(crate) mod manual {
    use super::Clock;
    use std::cell::Cell;

    /// Clock advanced by hand
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now: Cell<u64>,
    }

    impl ManualClock {
        pub fn advance(&self, ticks: u64) {
            self.now.set(self.now.get() + ticks);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> u64 {
            self.now.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::manual::ManualClock;
    use super::*;

    #[test]
    fn test_add_charges_one_bucket_per_cycle() {
        let clock = ManualClock::default();
        let mut stopwatch = Stopwatch::with_clock(&clock);
        let mut buckets = TimingBuckets::default();

        clock.advance(10);
        stopwatch.add(&mut buckets, Bucket::Lifecycle);
        clock.advance(3);
        stopwatch.add(&mut buckets, Bucket::Fixture);
        clock.advance(7);
        stopwatch.add(&mut buckets, Bucket::Body);
        clock.advance(2);
        stopwatch.add(&mut buckets, Bucket::Fixture);

        assert_eq!(
            buckets,
            TimingBuckets {
                lifecycle: 10,
                fixture: 5,
                body: 7
            }
        );
        assert_eq!(buckets.total(), 22);
    }

    #[test]
    fn test_discard_drops_interval() {
        let clock = ManualClock::default();
        let mut stopwatch = Stopwatch::with_clock(&clock);
        let mut buckets = TimingBuckets::default();

        clock.advance(50);
        stopwatch.discard();
        clock.advance(4);
        stopwatch.add(&mut buckets, Bucket::Body);

        assert_eq!(buckets.body, 4);
        assert_eq!(buckets.total(), 4);
    }

    #[test]
    fn test_merge_and_millis() {
        let mut total = TimingBuckets::default();
        total.merge(&TimingBuckets {
            lifecycle: 1_000_000,
            fixture: 0,
            body: 2_000_000,
        });
        total.merge(&TimingBuckets {
            lifecycle: 0,
            fixture: 500_000,
            body: 0,
        });
        assert_eq!(total.get(Bucket::Fixture), 500_000);
        assert!((ticks_to_millis(total.total()) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
