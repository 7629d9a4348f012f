//! End-to-end tests of the discovery, execution and reporting pipeline
//!
//! Modules are built in-process, so these tests cover everything the `tally`
//! binary does except loading dynamic libraries.

use pretty_assertions::assert_eq;
use std::io;
use tally_core::{
    args, arg, discover, skip, ClassResult, ExecutionObserver, Executor, Failure, Fixture, Invocation, Method,
    Module, Outcome, Param, RunConfig, Runner, Suite, TestClass, TestResult, TypeTag,
};
use thiserror::Error;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Default)]
struct Empty;

impl Fixture for Empty {}

/// Observer keeping every event as data
#[derive(Default)]
struct Recording {
    classes: Vec<String>,
    outcomes: Vec<(String, Outcome)>,
}

impl ExecutionObserver for Recording {
    fn class_started(&mut self, class: &TestClass<'_>) -> io::Result<()> {
        self.classes.push(class.name.to_string());
        Ok(())
    }

    fn invocation_finished(&mut self, invocation: &Invocation, outcome: &Outcome) -> io::Result<()> {
        self.outcomes.push((invocation.method.clone(), outcome.clone()));
        Ok(())
    }
}

fn execute(modules: &[Module]) -> (Vec<ClassResult>, Recording) {
    let mut recording = Recording::default();
    let results = {
        let mut executor = Executor::new(&mut recording);
        discover(modules)
            .iter()
            .map(|class| executor.execute(class).unwrap())
            .collect()
    };
    (results, recording)
}

fn run_plain(modules: &[Module]) -> (tally_core::RunResult, String) {
    let mut out = Vec::new();
    let run = Runner::new(RunConfig::plain()).run(modules, &mut out).unwrap();
    (run, String::from_utf8(out).unwrap())
}

#[derive(Error, Debug)]
#[error("disk quota exceeded")]
struct QuotaError;

#[derive(Error, Debug)]
#[error("could not save report")]
struct SaveError {
    #[source]
    source: QuotaError,
}

fn save() -> Result<(), SaveError> {
    Err(SaveError { source: QuotaError })
}

// ============================================================================
// Totals and exit status
// ============================================================================

#[test]
fn test_pass_and_skip_totals() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Class", || Empty)
            .test("MethodA", |_| Ok(()))
            .test("MethodB", |_| skip()),
    )];

    let (run, output) = run_plain(&modules);

    assert_eq!((run.passed, run.skipped, run.failed), (1, 1, 0));
    assert_eq!(run.exit_code(), 0);
    assert!(output.contains("    PASSED:    1 ( 50.000 %)"));
    assert!(output.contains("    SKIPPED:   1 ( 50.000 %)"));
}

#[test]
fn test_n_passing_invocations() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Many", || Empty).method(
            Method::parameterized("holds", |_, args| {
                let n: i32 = arg(args, 0)?;
                tally_core::ensure(n > 0, "n must be positive")
            })
            .params([Param::of(TypeTag::I32)])
            .case(args![1])
            .case(args![2])
            .case(args![3]),
        ),
    )];

    let (run, _) = run_plain(&modules);
    assert_eq!((run.passed, run.failed, run.skipped), (3, 0, 0));
}

#[test]
fn test_failure_chain_follows_error_sources() {
    let modules = vec![Module::new("libsample.so").suite(Suite::new("sample::Io", || Empty).test("saves", |_| {
        save()?;
        Ok(())
    }))];

    let (results, recording) = execute(&modules);

    assert_eq!(results[0].failed, 1);
    let (method, outcome) = &recording.outcomes[0];
    assert_eq!(method, "saves");
    let Outcome::Fail(chain) = outcome else {
        panic!("expected a failure, got {:?}", outcome);
    };
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.links()[0].message, "could not save report");
    assert_eq!(chain.links()[1].message, "disk quota exceeded");
}

#[test]
fn test_plain_failure_fails_the_run() {
    let modules = vec![Module::new("libsample.so").suite(Suite::new("sample::Plain", || Empty).test("raises", |_| {
        Err(Failure::new("state", "outer").caused_by(Failure::new("io", "root cause")))
    }))];

    let (run, output) = run_plain(&modules);

    assert_eq!(run.failed, 1);
    assert_eq!(run.exit_code(), 1);
    assert!(output.contains("        [FAIL] Testing 'raises()' with ()"));
    assert!(output.contains("                  [state] outer"));
    assert!(output.contains("                  [io] root cause"));
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_classes_run_by_priority_then_name() {
    let modules = vec![Module::new("libsample.so")
        .suite(Suite::new("B", || Empty).priority(5).test("t", |_| Ok(())))
        .suite(Suite::new("A", || Empty).priority(0).test("t", |_| Ok(())))
        .suite(Suite::new("C", || Empty).priority(5).test("t", |_| Ok(())))
        .suite(Suite::new("D", || Empty).priority(3).test("t", |_| Ok(())))];

    let (_, recording) = execute(&modules);
    assert_eq!(recording.classes, vec!["B", "C", "D", "A"]);
}

#[test]
fn test_invocations_run_in_method_name_order() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Order", || Empty)
            .test("zeta", |_| Ok(()))
            .method(
                Method::parameterized("alpha", |_, _| Ok(()))
                    .params([Param::of(TypeTag::Str)])
                    .case(args!["second"])
                    .case(args!["first"]),
            )
            .test("mid", |_| Ok(())),
    )];

    let (_, recording) = execute(&modules);
    let order: Vec<&str> = recording.outcomes.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(order, vec!["alpha", "alpha", "mid", "zeta"]);
}

// ============================================================================
// Skips
// ============================================================================

#[test]
fn test_skipped_class_runs_nothing() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Off", || -> Empty { panic!("never constructed") })
            .skip()
            .test("one", |_| Ok(()))
            .test("two", |_| Ok(())),
    )];

    let (results, recording) = execute(&modules);

    assert_eq!((results[0].skipped, results[0].passed, results[0].failed), (2, 0, 0));
    assert_eq!(results[0].timings.fixture, 0);
    assert_eq!(results[0].timings.body, 0);
    assert!(recording.outcomes.iter().all(|(_, outcome)| outcome.is_skip()));
}

#[test]
fn test_skipped_method_never_runs() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Partial", || Empty)
            .method(Method::new("broken", |_| panic!("must not run")).skip())
            .test("fine", |_| Ok(())),
    )];

    let (results, _) = execute(&modules);
    assert_eq!((results[0].skipped, results[0].passed), (1, 1));
}

// ============================================================================
// Panics and generic binding
// ============================================================================

#[test]
fn test_panicking_body_fails() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Panics", || Empty)
            .test("explodes", |_| panic!("boom"))
            .test("survives", |_| Ok(())),
    )];

    let (results, recording) = execute(&modules);

    assert_eq!((results[0].failed, results[0].passed), (1, 1));
    let Outcome::Fail(chain) = &recording.outcomes[0].1 else {
        panic!("expected a failure");
    };
    assert_eq!(chain.links()[0].type_tag, "panic");
    assert_eq!(chain.links()[0].message, "boom");
}

fn same<T: tally_core::FromValue + PartialEq + std::fmt::Debug>(_: &mut Empty, args: &[tally_core::Value]) -> TestResult {
    let left: T = arg(args, 0)?;
    let right: T = arg(args, 1)?;
    tally_core::ensure_eq(left, right)
}

#[test]
fn test_generic_binding() {
    let modules = vec![Module::new("libsample.so").suite(
        Suite::new("sample::Generic", || Empty).method(
            Method::generic("same", [Param::generic("T"), Param::generic("T")], |types| match types {
                [TypeTag::I64] => Some(same::<i64>),
                [TypeTag::Str] => Some(same::<String>),
                _ => None,
            })
            .case(args![7i64, 7i64])
            .case(args!["a", "a"])
            .case(args![1i64, "a"])
            .case(args![true, true]),
        ),
    )];

    let (results, recording) = execute(&modules);

    assert_eq!((results[0].passed, results[0].failed), (2, 2));
    let tags: Vec<&str> = recording
        .outcomes
        .iter()
        .filter_map(|(_, outcome)| match outcome {
            Outcome::Fail(chain) => chain.root().map(|link| link.type_tag.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(tags, vec!["binding", "binding"]);
}

// ============================================================================
// Report
// ============================================================================

#[test]
fn test_report_layout() {
    let modules = vec![Module::new("libsample.so").suite(Suite::new("sample::Report", || Empty).test("ok", |_| Ok(())))];

    let (_, output) = run_plain(&modules);
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0].chars().count(), tally_core::report::DEFAULT_WIDTH);
    assert!(lines[0].contains(" UNIT TESTS "));
    assert!(output.contains("Testing 1 type(s):\n    [libsample.so] sample::Report\n"));
    assert!(output.contains("    Testing class 'sample::Report'\n        [PASS] Testing 'ok()' with ()\n"));
    assert!(output.contains("        CLASS:   sample::Report"));
    assert!(output.contains("] TIME/TOTAL"));
    assert!(output.contains("] TIME DISTR"));
    assert!(output.contains("] PASS/SKIP/FAIL"));
    assert!(output.contains("    GRAPH COLORS:"));
    assert_eq!(lines.last().copied(), Some("=".repeat(110).as_str()));
}
