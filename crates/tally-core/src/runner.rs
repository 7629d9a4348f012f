//! Test runner - discovery, execution and reporting of a whole run

use crate::aggregate::{aggregate, RunResult};
use crate::discovery::discover;
use crate::error::TallyResult;
use crate::executor::{Executor, LifecyclePolicy};
use crate::module::Module;
use crate::report::{RenderContext, Style, DEFAULT_WIDTH};
use std::io::Write;
use tracing::{debug, info};

/// Narrowest report the renderer supports
pub const MIN_WIDTH: usize = 40;

/// Settings of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Report width in columns
    pub width: usize,
    pub style: Style,
    /// In-place status updates through cursor movement
    pub cursor: bool,
    /// Columns of the terminal the output goes to, `None` for other writers
    pub columns: Option<u16>,
    pub lifecycle_policy: LifecyclePolicy,
}

impl RunConfig {
    /// Width clamped to [`MIN_WIDTH`]
    pub fn effective_width(&self) -> usize {
        self.width.max(MIN_WIDTH)
    }

    /// Colorless output without cursor movement
    pub fn plain() -> Self {
        Self {
            style: Style::plain(),
            cursor: false,
            ..Self::default()
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            style: Style::default(),
            cursor: true,
            columns: None,
            lifecycle_policy: LifecyclePolicy::default(),
        }
    }
}

/// Drives modules through discovery, execution and reporting
pub struct Runner {
    config: RunConfig,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run every suite of `modules`, writing progress and the report to `out`
    ///
    /// The returned result's [`RunResult::exit_code`] is the process status.
    pub fn run<W: Write>(&self, modules: &[Module], out: W) -> TallyResult<RunResult> {
        let mut context = RenderContext::new(out)
            .with_style(self.config.style)
            .with_cursor(self.config.cursor)
            .with_width(self.config.effective_width())
            .with_columns(self.config.columns);

        context.write_header("UNIT TESTS")?;

        let classes = discover(modules);
        context.write_discovery(&classes)?;

        let mut results = Vec::with_capacity(classes.len());
        {
            let mut executor = Executor::new(&mut context).with_policy(self.config.lifecycle_policy);
            for class in &classes {
                debug!(target: "tally::runner", class = class.name, module = class.module, "Running class");
                results.push(executor.execute(class)?);
            }
        }

        let run = aggregate(modules.len(), results);
        context.write_results(&run)?;

        info!(
            target: "tally::runner",
            classes = run.classes.len(),
            passed = run.passed,
            skipped = run.skipped,
            failed = run.failed,
            "Run finished"
        );

        Ok(run)
    }
}
