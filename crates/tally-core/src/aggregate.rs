//! Aggregation of class results into run totals

use crate::executor::ClassResult;
use crate::timing::{Bucket, TimingBuckets};

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    /// Number of modules handed to the run
    pub modules: usize,
    /// Class results in execution order
    pub classes: Vec<ClassResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Sum of every class's timings
    pub timings: TimingBuckets,
}

impl RunResult {
    /// Number of invocations
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn pass_ratio(&self) -> f64 {
        ratio(self.passed as f64, self.total() as f64)
    }

    pub fn skip_ratio(&self) -> f64 {
        ratio(self.skipped as f64, self.total() as f64)
    }

    pub fn fail_ratio(&self) -> f64 {
        ratio(self.failed as f64, self.total() as f64)
    }

    /// Total elapsed ticks
    pub fn elapsed(&self) -> u64 {
        self.timings.total()
    }

    /// Static hook failures not attributed to any invocation
    pub fn lifecycle_failures(&self) -> usize {
        self.classes.iter().map(|c| c.lifecycle_failures.len()).sum()
    }

    /// Process exit status: every failure of the run
    pub fn exit_code(&self) -> usize {
        self.failed + self.lifecycle_failures()
    }
}

impl ClassResult {
    pub fn pass_ratio(&self) -> f64 {
        ratio(self.passed as f64, self.total() as f64)
    }

    pub fn skip_ratio(&self) -> f64 {
        ratio(self.skipped as f64, self.total() as f64)
    }

    pub fn fail_ratio(&self) -> f64 {
        ratio(self.failed as f64, self.total() as f64)
    }

    /// Share of the run's elapsed ticks spent on this class
    pub fn time_share(&self, run_elapsed: u64) -> f64 {
        ratio(self.timings.total() as f64, run_elapsed as f64)
    }

    /// Share of this class's ticks charged to `bucket`
    pub fn bucket_share(&self, bucket: Bucket) -> f64 {
        ratio(self.timings.get(bucket) as f64, self.timings.total() as f64)
    }
}

/// Fold class results into run totals
pub fn aggregate(modules: usize, classes: Vec<ClassResult>) -> RunResult {
    let mut run = RunResult {
        modules,
        ..RunResult::default()
    };

    for class in &classes {
        run.passed += class.passed;
        run.failed += class.failed;
        run.skipped += class.skipped;
        run.timings.merge(&class.timings);
    }
    run.classes = classes;
    run
}
