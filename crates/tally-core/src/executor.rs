//! Test executor - drive one class through its lifecycle
//!
//! For every class: construct the fixture, run its static init hook, run
//! every invocation (init, body, cleanup) in method-name order, then run the
//! static cleanup hook. Each invocation is isolated: whatever it raises is
//! classified and recorded, never propagated.

use crate::discovery::TestClass;
use crate::error::{TallyError, TallyResult};
use crate::failure::{catch_panic, Failure, TestResult};
use crate::outcome::{classify, CauseChain, Outcome};
use crate::suite::{Invocation, SuiteInstance};
use crate::timing::{Bucket, Clock, MonotonicClock, Stopwatch, TimingBuckets};
use std::fmt;
use std::io;
use tracing::{debug, trace, warn};

/// What happens when a constructor or static hook fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecyclePolicy {
    /// Report the failure with the class and carry on with the run
    #[default]
    Isolate,
    /// Abort the whole run
    Abort,
}

/// Once-per-class lifecycle steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Constructor,
    StaticInit,
    StaticCleanup,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::Constructor => "constructor",
            Hook::StaticInit => "static init",
            Hook::StaticCleanup => "static cleanup",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed static hook that is not attributed to any invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleFailure {
    pub hook: Hook,
    pub chain: CauseChain,
}

/// Counts and timings of one executed class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassResult {
    pub name: String,
    pub module: String,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timings: TimingBuckets,
    pub lifecycle_failures: Vec<LifecycleFailure>,
}

impl ClassResult {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            passed: 0,
            failed: 0,
            skipped: 0,
            timings: TimingBuckets::default(),
            lifecycle_failures: Vec::new(),
        }
    }

    /// Number of invocations
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Skip => self.skipped += 1,
            Outcome::Fail(_) => self.failed += 1,
        }
    }
}

/// Receives progress while a class executes
///
/// The console renderer implements this to draw the per-invocation status
/// lines. Time spent in observer callbacks is never charged to a bucket.
pub trait ExecutionObserver {
    fn class_started(&mut self, _class: &TestClass<'_>) -> io::Result<()> {
        Ok(())
    }

    fn invocation_started(&mut self, _invocation: &Invocation) -> io::Result<()> {
        Ok(())
    }

    fn invocation_finished(&mut self, _invocation: &Invocation, _outcome: &Outcome) -> io::Result<()> {
        Ok(())
    }

    fn lifecycle_failed(&mut self, _class: &TestClass<'_>, _failure: &LifecycleFailure) -> io::Result<()> {
        Ok(())
    }
}

/// Observer that ignores everything
#[derive(Debug, Default)]
pub struct NullObserver;

impl ExecutionObserver for NullObserver {}

/// Executes classes one at a time
pub struct Executor<'o, C: Clock = MonotonicClock> {
    stopwatch: Stopwatch<C>,
    policy: LifecyclePolicy,
    observer: &'o mut dyn ExecutionObserver,
}

impl<'o> Executor<'o, MonotonicClock> {
    pub fn new(observer: &'o mut dyn ExecutionObserver) -> Self {
        Self::with_clock(MonotonicClock::new(), observer)
    }
}

impl<'o, C: Clock> Executor<'o, C> {
    pub fn with_clock(clock: C, observer: &'o mut dyn ExecutionObserver) -> Self {
        Self {
            stopwatch: Stopwatch::with_clock(clock),
            policy: LifecyclePolicy::default(),
            observer,
        }
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Execute every invocation of `class`
    pub fn execute(&mut self, class: &TestClass<'_>) -> TallyResult<ClassResult> {
        let mut result = ClassResult::new(class.name, class.module);
        self.observer.class_started(class)?;

        let mut invocations = class.suite.invocations();
        // Stable: argument sets of one method keep their declaration order
        invocations.sort_by(|a, b| a.method.cmp(&b.method));

        debug!(
            target: "tally::executor",
            class = class.name,
            invocations = invocations.len(),
            skip = class.skip,
            "Executing class"
        );

        // Failure of the constructor or static init, charged to every invocation
        let mut broken: Option<Failure> = None;
        let mut instance: Option<Box<dyn SuiteInstance + '_>> = None;

        if !class.skip {
            self.stopwatch.restart();
            let constructed = catch_panic(|| class.suite.instantiate()).and_then(|r| r);
            self.stopwatch.add(&mut result.timings, Bucket::Lifecycle);

            match constructed {
                Ok(constructed) => instance = Some(constructed),
                Err(failure) => broken = Some(self.hook_failed(class, Hook::Constructor, failure)?),
            }

            if let Some(instance) = instance.as_mut() {
                self.stopwatch.restart();
                let outcome = run_hook(|| instance.static_init());
                self.stopwatch.add(&mut result.timings, Bucket::Lifecycle);

                if let Err(failure) = outcome {
                    broken = Some(self.hook_failed(class, Hook::StaticInit, failure)?);
                }
            }
        }

        for invocation in &invocations {
            self.observer.invocation_started(invocation)?;

            let outcome = match (&broken, instance.as_mut()) {
                _ if invocation.skip || class.skip => {
                    self.stopwatch.discard();
                    Outcome::Skip
                }
                (Some(failure), _) => classify(Some(failure)),
                (None, Some(instance)) => {
                    let raised = self.run_invocation(&mut **instance, invocation, &mut result.timings);
                    classify(raised.as_ref())
                }
                (None, None) => unreachable!("an unskipped class has an instance or a hook failure"),
            };

            trace!(
                target: "tally::executor",
                class = class.name,
                method = invocation.method.as_str(),
                outcome = outcome.label(),
                "Invocation finished"
            );

            result.record(&outcome);
            self.observer.invocation_finished(invocation, &outcome)?;
        }

        if let Some(mut instance) = instance {
            self.stopwatch.restart();
            let outcome = run_hook(|| instance.static_cleanup());
            drop(instance);
            self.stopwatch.add(&mut result.timings, Bucket::Lifecycle);

            if let Err(failure) = outcome {
                let wrapped = self.hook_failed(class, Hook::StaticCleanup, failure)?;
                if let Outcome::Fail(chain) = classify(Some(&wrapped)) {
                    let failure = LifecycleFailure {
                        hook: Hook::StaticCleanup,
                        chain,
                    };
                    self.observer.lifecycle_failed(class, &failure)?;
                    result.lifecycle_failures.push(failure);
                }
            }
        }

        debug!(
            target: "tally::executor",
            class = class.name,
            passed = result.passed,
            skipped = result.skipped,
            failed = result.failed,
            ticks = result.timings.total(),
            "Class finished"
        );

        Ok(result)
    }

    /// Bind, then run init, body and cleanup, stopping at the first failure
    ///
    /// An invocation that fails to bind runs no hook and is charged nothing.
    /// Cleanup only runs when init and body succeeded.
    fn run_invocation(
        &mut self,
        instance: &mut (dyn SuiteInstance + '_),
        invocation: &Invocation,
        timings: &mut TimingBuckets,
    ) -> Option<Failure> {
        let bound = run_hook(|| instance.bind(invocation));
        self.stopwatch.discard();
        if let Err(failure) = bound {
            return Some(Failure::invocation(&invocation.method, failure));
        }

        let init = run_hook(|| instance.init());
        self.stopwatch.add(timings, Bucket::Fixture);
        if let Err(failure) = init {
            return Some(Failure::invocation("init", failure));
        }

        let body = run_hook(|| instance.invoke(invocation));
        self.stopwatch.add(timings, Bucket::Body);
        if let Err(failure) = body {
            return Some(Failure::invocation(&invocation.method, failure));
        }

        let cleanup = run_hook(|| instance.cleanup());
        self.stopwatch.add(timings, Bucket::Fixture);
        cleanup.err().map(|failure| Failure::invocation("cleanup", failure))
    }

    /// Wrap a hook failure, or abort the run under [`LifecyclePolicy::Abort`]
    fn hook_failed(&mut self, class: &TestClass<'_>, hook: Hook, failure: Failure) -> TallyResult<Failure> {
        let wrapped = Failure::invocation(hook.as_str(), failure);
        let Outcome::Fail(chain) = classify(Some(&wrapped)) else {
            return Ok(wrapped);
        };

        warn!(
            target: "tally::executor",
            class = class.name,
            hook = hook.as_str(),
            "Lifecycle hook failed"
        );

        if self.policy == LifecyclePolicy::Abort {
            let message = chain
                .links()
                .iter()
                .map(|link| format!("[{}] {}", link.type_tag, link.message))
                .collect::<Vec<_>>()
                .join(" <- ");
            return Err(TallyError::Lifecycle {
                class: class.name.to_string(),
                hook,
                message,
            });
        }
        Ok(wrapped)
    }
}

fn run_hook(hook: impl FnOnce() -> TestResult) -> TestResult {
    catch_panic(hook).and_then(|result| result)
}
