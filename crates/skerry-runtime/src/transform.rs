//! The source transformer consumed by the runtime.
//!
//! A transformer turns a file path into an executable wrapper. The
//! wrapper invocation ABI is fixed: every compiled module body receives
//! the seven-slot scope below, mirroring
//! `(module, exports, require, __dirname, __filename, global, <control surface>)`.

use crate::error::RuntimeError;
use crate::module::ModuleHandle;
use crate::require::Require;
use crate::surface::Surface;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Options threaded into a transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    /// Internal plumbing modules are never intercepted by user mocks;
    /// transformers may also treat them differently.
    pub is_internal_module: bool,
}

/// Transformer failure.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The source failed to parse. The runtime rewraps this with
    /// diagnostic context.
    #[error("Syntax error in {}: {message}", .path.display())]
    Syntax { path: PathBuf, message: String },

    /// Any other transform failure; propagated unchanged.
    #[error("Failed to transform {}: {message}", .path.display())]
    Failed { path: PathBuf, message: String },
}

/// The argument list a compiled wrapper is invoked with.
pub struct WrapperScope<'a> {
    /// The module record under execution.
    pub module: ModuleHandle,
    /// The record's exports object (a shared handle; property writes are
    /// visible through the registry immediately).
    pub exports: Value,
    /// The require implementation scoped to this module.
    pub require: Require,
    /// Directory containing the module file.
    pub dirname: &'a Path,
    /// The module file.
    pub filename: &'a Path,
    /// The sandbox global object.
    pub global: Value,
    /// The runtime control surface scoped to this module.
    pub surface: Surface,
}

/// A compiled module body.
pub type WrapperFn = Rc<dyn Fn(&mut WrapperScope<'_>) -> Result<(), RuntimeError>>;

/// Result of a successful transform.
#[derive(Clone)]
pub struct CompiledModule {
    pub wrapper: WrapperFn,
}

/// Produces an executable wrapper for a file.
pub trait Transformer {
    fn transform(
        &self,
        filename: &Path,
        options: &TransformOptions,
    ) -> Result<CompiledModule, TransformError>;
}

/// Table-backed transformer: wrappers are registered per path ahead of
/// time. The shipped default, also used by the test suite as the
/// stand-in for a real compiler.
#[derive(Default)]
pub struct ScriptedTransformer {
    scripts: RefCell<FxHashMap<PathBuf, WrapperFn>>,
}

impl ScriptedTransformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the wrapper served for `path`.
    pub fn add_script(
        &self,
        path: impl Into<PathBuf>,
        wrapper: impl Fn(&mut WrapperScope<'_>) -> Result<(), RuntimeError> + 'static,
    ) {
        self.scripts
            .borrow_mut()
            .insert(path.into(), Rc::new(wrapper));
    }
}

impl Transformer for ScriptedTransformer {
    fn transform(
        &self,
        filename: &Path,
        _options: &TransformOptions,
    ) -> Result<CompiledModule, TransformError> {
        self.scripts
            .borrow()
            .get(filename)
            .cloned()
            .map(|wrapper| CompiledModule { wrapper })
            .ok_or_else(|| TransformError::Failed {
                path: filename.to_path_buf(),
                message: "no script registered for this path".to_string(),
            })
    }
}
