//! Pure formatting of run and class statistics

use super::graph::Graph;
use super::{palette, Style};
use crate::aggregate::RunResult;
use crate::discovery::TestClass;
use crate::executor::ClassResult;
use crate::outcome::CauseChain;
use crate::timing::{ticks_to_millis, Bucket};
use std::fmt::Write;

/// Distance between the report width and the per-class graphs' width
const DETAIL_GRAPH_INSET: usize = 35;
const DETAIL_PADDING: usize = 8;

/// Indentation of a failure link's header line
pub const LINK_INDENT: usize = 18;
/// Indentation of a failure link's trace lines
pub const TRACE_INDENT: usize = 16;

/// `text` centered in a line of `=` of `width` columns
///
/// An odd leftover is padded on the right.
pub fn header(text: &str, width: usize) -> String {
    let line_width = width.saturating_sub(text.chars().count() + 2);
    let line = "=".repeat(line_width / 2);
    let odd = if line_width % 2 == 0 { "" } else { "=" };
    format!("{} {} {}{}", line, text, line, odd)
}

/// A full-width closing rule
pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

/// The list of classes about to run
pub fn discovery(classes: &[TestClass<'_>]) -> String {
    let mut out = format!("\nTesting {} type(s):\n", classes.len());
    for class in classes {
        let _ = writeln!(out, "    [{}] {}", class.module, class.name);
    }
    out
}

/// Every link of a cause chain with its trace
pub fn failure_chain(chain: &CauseChain, style: Style) -> String {
    let mut out = String::new();
    for link in chain.links() {
        let _ = writeln!(out, "{}[{}] {}", " ".repeat(LINK_INDENT), link.type_tag, link.message);
        for line in link.indented_trace(TRACE_INDENT) {
            let _ = writeln!(out, "{}", line);
        }
    }
    style.paint(&out, palette::FAILED)
}

fn percent(ratio: f64) -> String {
    format!("{:>7.3}", ratio * 100.0)
}

fn millis(ticks: u64) -> String {
    format!("{:>9.3}", ticks_to_millis(ticks))
}

/// Outcome graph followed by the global totals
pub fn summary(run: &RunResult, style: Style, width: usize) -> String {
    let graph = Graph::new()
        .segment(run.pass_ratio(), palette::PASSED)
        .segment(run.skip_ratio(), palette::SKIPPED)
        .segment(run.fail_ratio(), palette::FAILED);

    let mut out = graph.render(0, width, "", style);
    out.push('\n');
    let _ = write!(
        out,
        "\n    MODULES: {:>3}\
         \n    CLASSES: {:>3}\
         \n    TOTAL:   {:>3}\
         \n    PASSED:  {:>3} ({} %)\
         \n    SKIPPED: {:>3} ({} %)\
         \n    FAILED:  {:>3} ({} %)\
         \n    TIME:    {} ms\
         \n    DETAILS:",
        run.modules,
        run.classes.len(),
        run.total(),
        run.passed,
        percent(run.pass_ratio()),
        run.skipped,
        percent(run.skip_ratio()),
        run.failed,
        percent(run.fail_ratio()),
        millis(run.elapsed()),
    );
    out
}

/// Breakdown and graphs of one class
pub fn class_section(class: &ClassResult, run_elapsed: u64, style: Style, width: usize) -> String {
    let share = class.time_share(run_elapsed);
    let lifecycle = class.bucket_share(Bucket::Lifecycle);
    let fixture = class.bucket_share(Bucket::Fixture);
    let body = class.bucket_share(Bucket::Body);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n        CLASS:   {}\
         \n        MODULE:  {}\
         \n        PASSED:  {:>3} ({} %)\
         \n        SKIPPED: {:>3} ({} %)\
         \n        FAILED:  {:>3} ({} %)\
         \n        TIME:    {} ms ({} %)\
         \n            CONSTRUCTORS AND DESTRUCTORS: {} ms ({} %)\
         \n            INITIALIZATION AND CLEANUP:   {} ms ({} %)\
         \n            METHOD TEST RUNS:             {} ms ({} %)",
        class.name,
        class.module,
        class.passed,
        percent(class.pass_ratio()),
        class.skipped,
        percent(class.skip_ratio()),
        class.failed,
        percent(class.fail_ratio()),
        millis(class.timings.total()),
        percent(share),
        millis(class.timings.lifecycle),
        percent(lifecycle),
        millis(class.timings.fixture),
        percent(fixture),
        millis(class.timings.body),
        percent(body),
    );

    let graph_width = width.saturating_sub(DETAIL_GRAPH_INSET);
    let graphs = [
        (
            Graph::new()
                .segment(share, palette::TIME_USED)
                .segment(1.0 - share, palette::TIME_OTHER),
            "TIME/TOTAL",
        ),
        (
            Graph::new()
                .segment(lifecycle, palette::LIFECYCLE)
                .segment(fixture, palette::FIXTURE)
                .segment(body, palette::BODY),
            "TIME DISTR",
        ),
        (
            Graph::new()
                .segment(class.passed as f64, palette::PASSED)
                .segment(class.skipped as f64, palette::SKIPPED)
                .segment(class.failed as f64, palette::FAILED),
            "PASS/SKIP/FAIL",
        ),
    ];
    for (graph, description) in &graphs {
        let _ = writeln!(out, "{}", graph.render(DETAIL_PADDING, graph_width, description, style));
    }

    if !class.lifecycle_failures.is_empty() {
        let _ = writeln!(out, "        LIFECYCLE FAILURES:");
        for failure in &class.lifecycle_failures {
            let _ = writeln!(out, "            [{}] {}", style.paint("FAIL", palette::FAILED), failure.hook);
            out.push_str(&failure_chain(&failure.chain, style));
        }
    }
    out
}

/// Meaning of every graph color
pub fn legend(style: Style) -> String {
    let items = [
        (palette::PASSED, "Passed test methods"),
        (palette::SKIPPED, "Skipped test methods"),
        (palette::FAILED, "Failed test methods"),
        (palette::TIME_USED, "Time used for testing (relative to the total time)"),
        (
            palette::LIFECYCLE,
            "Time used for the class's construction, static init, static cleanup and drop",
        ),
        (palette::FIXTURE, "Time used for the per-test init and cleanup hooks"),
        (palette::BODY, "Time used for the test method bodies"),
    ];

    let mut out = String::from("    GRAPH COLORS:\n");
    for (color, description) in items {
        let _ = writeln!(out, "{}{}", style.paint("       ### ", color), description);
    }
    out
}

/// The complete results section printed after the last class
pub fn results(run: &RunResult, style: Style, width: usize) -> String {
    let mut out = format!("\n{}\n", header("TEST RESULTS", width));
    out.push_str(&summary(run, style, width));
    for class in &run.classes {
        out.push_str(&class_section(class, run.elapsed(), style, width));
    }
    out.push('\n');
    if !run.classes.is_empty() {
        out.push_str(&legend(style));
    }
    out.push('\n');
    out.push_str(&rule(width));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::executor::{Hook, LifecycleFailure};
    use crate::failure::Failure;
    use crate::outcome::{classify, Outcome};
    use crate::timing::TimingBuckets;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const MS: u64 = 1_000_000;

    #[rstest]
    #[case("UNIT TESTS", 20, "==== UNIT TESTS ====")]
    #[case("ODD", 10, "== ODD ===")]
    #[case("TEST RESULTS", 13, " TEST RESULTS ")]
    fn test_header(#[case] text: &str, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(header(text, width), expected);
    }

    #[test]
    fn test_header_fills_width() {
        for width in 20..40 {
            assert_eq!(header("UNIT TESTS", width).len(), width);
        }
    }

    fn sample_run() -> RunResult {
        let calc = ClassResult {
            passed: 1,
            skipped: 1,
            timings: TimingBuckets {
                lifecycle: MS,
                fixture: 0,
                body: 3 * MS,
            },
            ..ClassResult::new("math::Calc", "libmath.so")
        };
        aggregate(1, vec![calc])
    }

    #[test]
    fn test_summary_lines() {
        let text = summary(&sample_run(), Style::plain(), 12);
        assert_eq!(
            text,
            "[##########] \n\
             \n    MODULES:   1\
             \n    CLASSES:   1\
             \n    TOTAL:     2\
             \n    PASSED:    1 ( 50.000 %)\
             \n    SKIPPED:   1 ( 50.000 %)\
             \n    FAILED:    0 (  0.000 %)\
             \n    TIME:        4.000 ms\
             \n    DETAILS:"
        );
    }

    #[test]
    fn test_class_section() {
        let run = sample_run();
        let text = class_section(&run.classes[0], run.elapsed(), Style::plain(), 47);
        assert_eq!(
            text,
            "\n        CLASS:   math::Calc\
             \n        MODULE:  libmath.so\
             \n        PASSED:    1 ( 50.000 %)\
             \n        SKIPPED:   1 ( 50.000 %)\
             \n        FAILED:    0 (  0.000 %)\
             \n        TIME:        4.000 ms (100.000 %)\
             \n            CONSTRUCTORS AND DESTRUCTORS:     1.000 ms ( 25.000 %)\
             \n            INITIALIZATION AND CLEANUP:       0.000 ms (  0.000 %)\
             \n            METHOD TEST RUNS:                 3.000 ms ( 75.000 %)\
             \n        [##########] TIME/TOTAL\
             \n        [##########] TIME DISTR\
             \n        [##########] PASS/SKIP/FAIL\n"
        );
    }

    #[test]
    fn test_class_section_lists_lifecycle_failures() {
        let raised = Failure::invocation("static cleanup", Failure::new("io", "socket closed").with_trace(["at a.rs:1:1"]));
        let Outcome::Fail(chain) = classify(Some(&raised)) else {
            panic!("expected a failure");
        };
        let mut class = ClassResult::new("net::Client", "libnet.so");
        class.lifecycle_failures.push(LifecycleFailure {
            hook: Hook::StaticCleanup,
            chain,
        });

        let text = class_section(&class, 0, Style::plain(), 47);
        assert!(text.ends_with(
            "        LIFECYCLE FAILURES:\n            [FAIL] static cleanup\n                  [io] socket closed\n                at a.rs:1:1\n"
        ));
    }

    #[test]
    fn test_results_without_classes_has_no_legend() {
        let run = aggregate(0, Vec::new());
        let text = results(&run, Style::plain(), 40);
        assert!(!text.contains("GRAPH COLORS"));
        assert!(text.contains("    TOTAL:     0"));
        assert!(text.ends_with(&format!("\n{}\n", rule(40))));
    }

    #[test]
    fn test_results_with_classes_has_legend_once() {
        let text = results(&sample_run(), Style::plain(), 60);
        assert_eq!(text.matches("GRAPH COLORS").count(), 1);
        assert!(text.contains("       ### Passed test methods\n"));
        assert!(text.starts_with(&format!("\n{}\n", header("TEST RESULTS", 60))));
    }

    #[test]
    fn test_discovery_listing() {
        use crate::module::Module;
        use crate::suite::{Fixture, Suite};

        struct Unit;
        impl Fixture for Unit {}

        let modules = vec![Module::new("libmath.so").suite(Suite::new("math::Calc", || Unit))];
        let classes = crate::discovery::discover(&modules);
        assert_eq!(discovery(&classes), "\nTesting 1 type(s):\n    [libmath.so] math::Calc\n");
    }

    #[test]
    fn test_failure_chain_indentation() {
        let raised = Failure::invocation(
            "adds",
            Failure::new("context", "outer").with_trace(["at x.rs:2:3", "at y.rs:4:5"]).caused_by(
                Failure::new("assertion", "inner").with_trace(Vec::<String>::new()),
            ),
        );
        let Outcome::Fail(chain) = classify(Some(&raised)) else {
            panic!("expected a failure");
        };
        assert_eq!(
            failure_chain(&chain, Style::plain()),
            "                  [context] outer\n                at x.rs:2:3\n                at y.rs:4:5\n                  [assertion] inner\n"
        );
    }
}
