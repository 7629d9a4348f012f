//! Console render context
//!
//! Owns the output writer and every piece of terminal state of a run. In
//! cursor mode each invocation line is printed with an empty `[    ]` slot
//! that is filled in place once the outcome is known. Otherwise the complete
//! line is printed after the invocation finished.

use super::{palette, text, Style, DEFAULT_WIDTH};
use crate::aggregate::RunResult;
use crate::discovery::TestClass;
use crate::executor::{ExecutionObserver, LifecycleFailure};
use crate::outcome::Outcome;
use crate::suite::Invocation;
use crossterm::{cursor, queue, terminal};
use std::io::{self, IsTerminal, Write};

const INVOCATION_INDENT: &str = "        ";
/// Column of the first character inside the status slot
const SLOT_COLUMN: u16 = 9;
const EMPTY_SLOT: &str = "[    ]";

/// Writer plus color, cursor and width settings for one run
pub struct RenderContext<W: Write> {
    out: W,
    style: Style,
    cursor: bool,
    width: usize,
    /// Columns of the terminal behind `out`, if any
    columns: Option<u16>,
    /// Rows the pending invocation line wrapped onto
    wrapped_rows: u16,
}

impl<W: Write> RenderContext<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            style: Style::default(),
            cursor: true,
            width: DEFAULT_WIDTH,
            columns: None,
            wrapped_rows: 0,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Enable or disable in-place status updates
    pub fn with_cursor(mut self, cursor: bool) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Columns of the terminal the writer is attached to
    ///
    /// Used to count the rows a long invocation line wraps onto. Without it
    /// the report width is assumed.
    pub fn with_columns(mut self, columns: Option<u16>) -> Self {
        self.columns = columns;
        self
    }

    pub fn write_header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text::header(title, self.width))
    }

    pub fn write_discovery(&mut self, classes: &[TestClass<'_>]) -> io::Result<()> {
        writeln!(self.out, "{}", text::discovery(classes))?;
        self.out.flush()
    }

    pub fn write_results(&mut self, run: &RunResult) -> io::Result<()> {
        write!(self.out, "{}", text::results(run, self.style, self.width))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(&self, outcome: &Outcome) -> String {
        let color = match outcome {
            Outcome::Pass => palette::PASSED,
            Outcome::Skip => palette::SKIPPED,
            Outcome::Fail(_) => palette::FAILED,
        };
        self.style.paint(outcome.label(), color)
    }

    fn columns(&self) -> usize {
        match self.columns {
            Some(columns) if columns > 0 => usize::from(columns),
            _ => self.width.max(1),
        }
    }
}

/// Columns of the terminal on stdout, `None` when stdout is not a terminal
pub fn stdout_columns() -> Option<u16> {
    if !io::stdout().is_terminal() {
        return None;
    }
    terminal::size().ok().map(|(columns, _)| columns)
}

fn invocation_line(invocation: &Invocation) -> String {
    format!(
        "Testing '{}' with ({})",
        invocation.describe(),
        invocation.display_args()
    )
}

impl<W: Write> ExecutionObserver for RenderContext<W> {
    fn class_started(&mut self, class: &TestClass<'_>) -> io::Result<()> {
        writeln!(self.out, "    Testing class '{}'", class.name)?;
        self.out.flush()
    }

    fn invocation_started(&mut self, invocation: &Invocation) -> io::Result<()> {
        if !self.cursor {
            return Ok(());
        }

        let line = format!("{}{} {}", INVOCATION_INDENT, EMPTY_SLOT, invocation_line(invocation));
        let length = line.chars().count();
        let rows = length.saturating_sub(1) / self.columns();
        self.wrapped_rows = u16::try_from(rows).unwrap_or(u16::MAX);

        write!(self.out, "{}", line)?;
        self.out.flush()
    }

    fn invocation_finished(&mut self, invocation: &Invocation, outcome: &Outcome) -> io::Result<()> {
        let label = self.label(outcome);

        if self.cursor {
            queue!(self.out, cursor::SavePosition)?;
            if self.wrapped_rows > 0 {
                queue!(self.out, cursor::MoveUp(self.wrapped_rows))?;
            }
            queue!(self.out, cursor::MoveToColumn(SLOT_COLUMN))?;
            write!(self.out, "{}", label)?;
            queue!(self.out, cursor::RestorePosition)?;
            writeln!(self.out)?;
            self.wrapped_rows = 0;
        } else {
            writeln!(
                self.out,
                "{}[{}] {}",
                INVOCATION_INDENT,
                label,
                invocation_line(invocation)
            )?;
        }

        if let Outcome::Fail(chain) = outcome {
            write!(self.out, "{}", text::failure_chain(chain, self.style))?;
        }
        self.out.flush()
    }

    fn lifecycle_failed(&mut self, class: &TestClass<'_>, failure: &LifecycleFailure) -> io::Result<()> {
        writeln!(
            self.out,
            "{}[{}] {} of '{}'",
            INVOCATION_INDENT,
            self.style.paint("FAIL", palette::FAILED),
            failure.hook,
            class.name
        )?;
        write!(self.out, "{}", text::failure_chain(&failure.chain, self.style))?;
        self.out.flush()
    }
}
