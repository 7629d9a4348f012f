//! Test modules
//!
//! A module is the unit handed to the runner: a named set of suites. Modules
//! built as dynamic libraries expose theirs through [`declare_module!`].

use crate::suite::TestSuite;
use std::fmt;

/// Symbol exporting the module constructor
pub const MODULE_ENTRY_SYMBOL: &str = "__tally_module";
/// Symbol exporting the tally-core version the module was built against
pub const MODULE_VERSION_SYMBOL: &str = "__tally_core_version";
/// Version of this crate, compared against [`MODULE_VERSION_SYMBOL`]
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Signature of [`MODULE_ENTRY_SYMBOL`]
pub type ModuleEntry = fn() -> Module;
/// Signature of [`MODULE_VERSION_SYMBOL`]
pub type ModuleVersion = fn() -> &'static str;

/// A named collection of test suites
pub struct Module {
    name: String,
    suites: Vec<Box<dyn TestSuite>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suites: Vec::new(),
        }
    }

    /// Register a suite
    pub fn suite(mut self, suite: impl TestSuite + 'static) -> Self {
        self.suites.push(Box::new(suite));
        self
    }

    /// Rename the module, e.g. after the file it was loaded from
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suites(&self) -> &[Box<dyn TestSuite>] {
        &self.suites
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field(
                "suites",
                &self.suites.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Export a module from a `cdylib` so `tally` can load it
///
/// ```ignore
/// fn module() -> tally_core::Module {
///     tally_core::Module::new("sample").suite(/* ... */)
/// }
///
/// tally_core::declare_module!(module);
/// ```
///
/// The runner and the module must be built with the same compiler and the
/// same tally-core version.
#[macro_export]
macro_rules! declare_module {
    ($constructor:path) => {
        #[no_mangle]
        pub fn __tally_module() -> $crate::Module {
            $constructor()
        }

        #[no_mangle]
        pub fn __tally_core_version() -> &'static str {
            $crate::CORE_VERSION
        }
    };
}
