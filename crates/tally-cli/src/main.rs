use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::io::{self, Write};
use std::process::ExitCode;
use tally_core::report::stdout_columns;
use tally_core::{Runner, MIN_WIDTH};
use tracing::debug;

mod config;
mod loader;
mod logging;

use config::{Config, Flags};
use loader::ModuleSet;

/// Console test runner for tally test modules.
///
/// Loads every MODULE (a dynamic library exporting its suites through
/// `tally_core::declare_module!`), runs the suites in priority order and
/// prints a report with per-class timing graphs. The exit status is the
/// number of failed tests, capped at 255.
///
/// EXAMPLES:
///     tally target/debug/libtally_sample.so      Run one module
///     tally liba.so libb.so --width 80           Two modules, narrower report
///     tally sample --plain --no-color            Resolve ./libsample.so, plain output
///
/// ENVIRONMENT VARIABLES:
///     TALLY_WIDTH                    Report width
///     TALLY_NO_COLOR, NO_COLOR       Set to disable colored output
///     TALLY_ABORT_ON_HOOK_FAILURE    Set to '1' to abort on lifecycle hook failures
///     TALLY_LOG                      Diagnostic log filter, e.g. 'tally=debug'
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version)]
struct Cli {
    /// Test modules to load, as paths or library names
    #[arg(required = true, value_name = "MODULE")]
    modules: Vec<String>,

    /// Report width in columns
    #[arg(long, env = "TALLY_WIDTH", default_value_t = tally_core::report::DEFAULT_WIDTH,
          value_parser = parse_width)]
    width: usize,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print each status after its line instead of updating it in place
    #[arg(long)]
    plain: bool,

    /// Abort the run when a constructor or static hook fails
    #[arg(long, env = "TALLY_ABORT_ON_HOOK_FAILURE", action = ArgAction::SetTrue,
          value_parser = BoolishValueParser::new())]
    abort_on_hook_failure: bool,

    /// Diagnostic logging on stderr (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

fn parse_width(value: &str) -> Result<usize, String> {
    let width: usize = value.parse().map_err(|_| format!("'{}' is not a number", value))?;
    if width < MIN_WIDTH {
        return Err(format!("width must be at least {}", MIN_WIDTH));
    }
    Ok(width)
}

impl Cli {
    fn flags(&self) -> Flags {
        Flags {
            width: self.width,
            no_color: self.no_color,
            plain: self.plain,
            abort_on_hook_failure: self.abort_on_hook_failure,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();
    logging::init(cli.verbose, config.log_filter.as_deref());

    match run(&cli, &config) {
        Ok(failures) => ExitCode::from(u8::try_from(failures).unwrap_or(u8::MAX)),
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

/// Load the modules, run them and return the failure count
fn run(cli: &Cli, config: &Config) -> Result<usize> {
    let stdout = io::stdout();
    let run_config = config.run_config(&cli.flags(), stdout_columns());

    let mut set = ModuleSet::new();
    for name in &cli.modules {
        set.load(name)
            .with_context(|| format!("Failed to load test module '{}'", name))?;
    }
    debug!(target: "tally::loader", modules = set.len(), "Modules loaded");

    let mut out = stdout.lock();
    let result = Runner::new(run_config)
        .run(set.modules(), &mut out)
        .context("Test run aborted")?;
    out.flush().context("Failed to flush output")?;

    Ok(result.exit_code())
}
