//! Failures raised by test code
//!
//! A [`Failure`] is what a test body, fixture hook or constructor hands back
//! to the runner instead of throwing. Failures nest through a "caused by"
//! link; the runner wraps everything that escapes an invocation in an
//! `invocation` failure, and the classifier sees through that wrapper.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Once;

/// Result type returned by test bodies and fixture hooks
pub type TestResult = Result<(), Failure>;

/// Type tag of the invocation wrapper
pub const INVOCATION_TAG: &str = "invocation";
/// Type tag of a caught panic
pub const PANIC_TAG: &str = "panic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Skip,
    Invocation,
    Raised,
}

/// A failure raised by test code, possibly caused by another failure
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    kind: Kind,
    type_tag: String,
    message: String,
    trace: Vec<String>,
    cause: Option<Box<Failure>>,
}

impl Failure {
    /// Raise a failure tagged `type_tag`, recording the caller as its location
    #[track_caller]
    pub fn new(type_tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: Kind::Raised,
            type_tag: type_tag.into(),
            message: message.into(),
            trace: vec![format_location(Location::caller())],
            cause: None,
        }
    }

    /// The skip sentinel. Carries no message and is never reported.
    pub fn skip() -> Self {
        Self {
            kind: Kind::Skip,
            type_tag: String::new(),
            message: String::new(),
            trace: Vec::new(),
            cause: None,
        }
    }

    /// Wrap `cause` as the failure of invoking `target`
    pub fn invocation(target: &str, cause: Failure) -> Self {
        Self {
            kind: Kind::Invocation,
            type_tag: INVOCATION_TAG.to_string(),
            message: format!("exception has been thrown by the target of '{}'", target),
            trace: Vec::new(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Attach `cause` as the failure this one was caused by
    pub fn caused_by(mut self, cause: Failure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Replace the location trace
    pub fn with_trace<I, S>(mut self, trace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trace = trace.into_iter().map(Into::into).collect();
        self
    }

    /// Convert any error into a failure, following `Error::source` for causes
    #[track_caller]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut failure = Failure::new(std::any::type_name::<E>(), error.to_string());
        failure.cause = error.source().map(|source| Box::new(source_failure(source)));
        failure
    }

    pub fn is_skip(&self) -> bool {
        self.kind == Kind::Skip
    }

    pub fn is_invocation(&self) -> bool {
        self.kind == Kind::Invocation
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    /// Iterate over the failures this one was caused by, outermost first
    pub fn causes(&self) -> impl Iterator<Item = &Failure> {
        std::iter::successors(self.cause(), |failure| failure.cause())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_skip() {
            return f.write_str("skipped");
        }
        write!(f, "[{}] {}", self.type_tag, self.message)
    }
}

impl<E> From<E> for Failure
where
    E: std::error::Error,
{
    #[track_caller]
    fn from(error: E) -> Self {
        Failure::from_error(&error)
    }
}

fn source_failure(error: &(dyn std::error::Error + 'static)) -> Failure {
    Failure {
        kind: Kind::Raised,
        type_tag: "source".to_string(),
        message: error.to_string(),
        trace: Vec::new(),
        cause: error.source().map(|source| Box::new(source_failure(source))),
    }
}

fn format_location(location: &Location<'_>) -> String {
    format!("at {}:{}:{}", location.file(), location.line(), location.column())
}

/// Skip the current test
///
/// ```
/// use tally_core::{skip, TestResult};
///
/// fn not_ready() -> TestResult {
///     skip()
/// }
/// assert!(not_ready().unwrap_err().is_skip());
/// ```
pub fn skip() -> TestResult {
    Err(Failure::skip())
}

// Panics are the thrown exceptions of Rust test code: the runner catches them
// at the invocation boundary. While a catch is active the hook records the
// panic location and backtrace instead of printing them.

thread_local! {
    static CATCHING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

static HOOK: Once = Once::new();

fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CATCHING.with(Cell::get) {
                previous(info);
                return;
            }
            let mut trace: Vec<String> = info.location().map(format_location).into_iter().collect();
            let backtrace = Backtrace::capture();
            if backtrace.status() == BacktraceStatus::Captured {
                trace.extend(backtrace.to_string().lines().map(str::to_string));
            }
            LAST_PANIC.with(|last| *last.borrow_mut() = trace);
        }));
    });
}

struct CatchGuard {
    was_catching: bool,
}

impl CatchGuard {
    fn enter() -> Self {
        Self {
            was_catching: CATCHING.with(|c| c.replace(true)),
        }
    }
}

impl Drop for CatchGuard {
    fn drop(&mut self) {
        CATCHING.with(|c| c.set(self.was_catching));
    }
}

/// Run `f`, turning a panic into a `panic` failure
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, Failure> {
    install_panic_hook();
    let result = {
        let _guard = CatchGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };
    result.map_err(|payload| {
        let trace = LAST_PANIC.with(|last| std::mem::take(&mut *last.borrow_mut()));
        Failure {
            kind: Kind::Raised,
            type_tag: PANIC_TAG.to_string(),
            message: panic_message(payload.as_ref()),
            trace,
            cause: None,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
