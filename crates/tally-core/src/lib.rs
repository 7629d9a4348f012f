//! Tally core
//!
//! Everything the `tally` runner needs short of loading modules from disk:
//! - Suite registration ([`Suite`], [`Method`], [`Fixture`])
//! - Discovery of the ordered class list from [`Module`]s
//! - Execution of each class with per-bucket timing
//! - Outcome classification and cause chains
//! - Aggregation and rendering of the final report
//!
//! # Example
//!
//! ```
//! use tally_core::{ensure_eq, skip, Fixture, Module, RunConfig, Runner, Suite};
//!
//! struct Calculator;
//!
//! impl Fixture for Calculator {}
//!
//! let modules = vec![Module::new("calc").suite(
//!     Suite::new("calc::Calculator", || Calculator)
//!         .test("adds", |_| ensure_eq(4, 2 + 2))
//!         .test("divides", |_| skip()),
//! )];
//!
//! let mut out = Vec::new();
//! let run = Runner::new(RunConfig::plain()).run(&modules, &mut out).unwrap();
//! assert_eq!((run.passed, run.skipped, run.failed), (1, 1, 0));
//! assert_eq!(run.exit_code(), 0);
//! ```

pub mod aggregate;
pub mod assert;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod failure;
pub mod module;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod suite;
pub mod timing;
pub mod value;

pub use aggregate::{aggregate, RunResult};
pub use assert::{assert_sequence_eq, assert_set_eq, ensure, ensure_eq};
pub use discovery::{discover, TestClass};
pub use error::{TallyError, TallyResult};
pub use executor::{ClassResult, ExecutionObserver, Executor, Hook, LifecycleFailure, LifecyclePolicy};
pub use failure::{catch_panic, skip, Failure, TestResult};
pub use module::{Module, ModuleEntry, ModuleVersion, CORE_VERSION, MODULE_ENTRY_SYMBOL, MODULE_VERSION_SYMBOL};
pub use outcome::{classify, CauseChain, Link, Outcome};
pub use report::{RenderContext, Style};
pub use runner::{RunConfig, Runner, MIN_WIDTH};
pub use suite::{BodyFn, Fixture, Invocation, Method, Param, Suite, SuiteInstance, TestSuite};
pub use timing::{Bucket, TimingBuckets};
pub use value::{arg, FromValue, TypeTag, Value};
