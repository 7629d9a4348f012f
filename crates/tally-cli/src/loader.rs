//! Dynamic loading of test modules
//!
//! A test module is a `cdylib` exporting the symbols of
//! `tally_core::declare_module!`. Modules are named after the file they were
//! loaded from.
//!
//! # Safety
//!
//! Loading a dynamic library runs its initialization code in this process,
//! and the exported entry point is called with the Rust ABI. Both sides must
//! be built by the same compiler against the same tally-core version; the
//! version symbol is checked before the entry point is called.

use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use tally_core::{catch_panic, Module, ModuleEntry, ModuleVersion, CORE_VERSION, MODULE_ENTRY_SYMBOL, MODULE_VERSION_SYMBOL};
use thiserror::Error;
use tracing::debug;

/// Module loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Test module not found: {0}")]
    NotFound(String),

    #[error("Failed to load test module {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Symbol '{symbol}' not found in {path}; was the module declared with declare_module!?")]
    SymbolNotFound { path: PathBuf, symbol: &'static str },

    #[error("{path} was built against tally-core {found}, this runner uses {expected}")]
    VersionMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("Entry point of {path} panicked: {message}")]
    EntryPanicked { path: PathBuf, message: String },
}

/// Loaded modules and the libraries their code lives in
///
/// Modules are declared first so they are dropped before their libraries.
#[derive(Default)]
pub struct ModuleSet {
    modules: Vec<Module>,
    libraries: Vec<Library>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the module at `name`, a path or a bare library name
    pub fn load(&mut self, name: &str) -> Result<&Module, LoadError> {
        let path = resolve_module_path(name).ok_or_else(|| LoadError::NotFound(name.to_string()))?;
        debug!(target: "tally::loader", path = %path.display(), "Loading module");

        let library = unsafe { Library::new(&path) }.map_err(|e| LoadError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let version = unsafe { symbol::<ModuleVersion>(&library, &path, MODULE_VERSION_SYMBOL)? };
        let found = version();
        if found != CORE_VERSION {
            return Err(LoadError::VersionMismatch {
                path,
                found: found.to_string(),
                expected: CORE_VERSION,
            });
        }

        let entry = unsafe { symbol::<ModuleEntry>(&library, &path, MODULE_ENTRY_SYMBOL)? };
        let module = catch_panic(entry).map_err(|failure| LoadError::EntryPanicked {
            path: path.clone(),
            message: failure.message().to_string(),
        })?;

        let module = module.with_name(module_name(&path));
        debug!(
            target: "tally::loader",
            module = module.name(),
            suites = module.suites().len(),
            "Module loaded"
        );

        self.libraries.push(library);
        self.modules.push(module);
        Ok(&self.modules[self.modules.len() - 1])
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

/// Look up `name` in `library` as a plain function pointer
///
/// # Safety
///
/// `T` must match the type the library exported `name` with.
unsafe fn symbol<T: Copy>(library: &Library, path: &Path, name: &'static str) -> Result<T, LoadError> {
    let symbol: Symbol<'_, T> = library.get(name.as_bytes()).map_err(|_| LoadError::SymbolNotFound {
        path: path.to_path_buf(),
        symbol: name,
    })?;
    Ok(*symbol)
}

/// Resolve a module argument to an existing file
///
/// An existing path is used as is. Otherwise `name` is tried as a library
/// name in the current directory with the platform's naming convention.
pub fn resolve_module_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let (prefix, extension) = if cfg!(target_os = "windows") {
        ("", "dll")
    } else if cfg!(target_os = "macos") {
        ("lib", "dylib")
    } else {
        ("lib", "so")
    };
    let file_name = format!("{}{}.{}", prefix, name, extension);
    let candidate = std::env::current_dir().ok()?.join(file_name);
    candidate.is_file().then_some(candidate)
}

/// File name of `path`, used as the module's name in the report
pub fn module_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
