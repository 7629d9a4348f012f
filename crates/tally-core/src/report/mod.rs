//! Report rendering
//!
//! [`text`] holds the pure formatting of run and class statistics,
//! [`graph`] the proportional bar graphs, and [`console`] the render
//! context that writes progress and the final report to a terminal.

pub mod console;
pub mod graph;
pub mod text;

pub use console::{stdout_columns, RenderContext};
pub use graph::{normalize, Graph};

use colored::{Color, Colorize};

/// Report width used by `tally` unless configured otherwise
pub const DEFAULT_WIDTH: usize = 110;

/// Graph colors
pub mod palette {
    use colored::Color;

    pub const PASSED: Color = Color::Green;
    pub const SKIPPED: Color = Color::Yellow;
    pub const FAILED: Color = Color::Red;
    pub const TIME_USED: Color = Color::Magenta;
    pub const TIME_OTHER: Color = Color::Black;
    pub const LIFECYCLE: Color = Color::Blue;
    pub const FIXTURE: Color = Color::BrightBlue;
    pub const BODY: Color = Color::Cyan;
}

/// Whether rendered text carries color codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub fn colored() -> Self {
        Self { color: true }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// `text` in `color`, or unchanged for plain output
    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.color && !text.is_empty() {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::colored()
    }
}
