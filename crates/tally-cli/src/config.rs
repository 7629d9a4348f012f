//! CLI configuration via environment variables
//!
//! Flags override the environment; both end up in a [`RunConfig`].

use std::env;
use tally_core::{LifecyclePolicy, RunConfig, Style};

/// Environment variable holding the tracing filter directives
pub const LOG_ENV: &str = "TALLY_LOG";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Disable colored output (TALLY_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Tracing filter (TALLY_LOG=tally=debug)
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("TALLY_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
            log_filter: env::var(LOG_ENV).ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// Combine the environment with the command-line flags
    ///
    /// `terminal_columns` is the width of the terminal on stdout, `None`
    /// when stdout is not a terminal. Cursor movement is only used with one.
    pub fn run_config(&self, flags: &Flags, terminal_columns: Option<u16>) -> RunConfig {
        let color = !(self.no_color || flags.no_color);
        RunConfig {
            width: flags.width,
            style: if color { Style::colored() } else { Style::plain() },
            cursor: terminal_columns.is_some() && !flags.plain,
            columns: terminal_columns,
            lifecycle_policy: if flags.abort_on_hook_failure {
                LifecyclePolicy::Abort
            } else {
                LifecyclePolicy::Isolate
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Output and policy flags of the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub width: usize,
    pub no_color: bool,
    pub plain: bool,
    pub abort_on_hook_failure: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            width: tally_core::report::DEFAULT_WIDTH,
            no_color: false,
            plain: false,
            abort_on_hook_failure: false,
        }
    }
}
