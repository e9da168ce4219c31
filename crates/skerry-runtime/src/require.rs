//! The per-module require implementation.
//!
//! Each executing module receives a callable with the caller's path and
//! internal-ness baked in; everything else delegates into the shared
//! runtime.

use crate::error::RuntimeError;
use crate::runtime::{RequireOptions, Runtime};
use crate::value::Value;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// A module-scoped require.
#[derive(Clone)]
pub struct Require {
    runtime: Weak<Runtime>,
    from: PathBuf,
    is_internal: bool,
    /// `require.cache`; present for API compatibility, intentionally
    /// empty.
    pub cache: Value,
    /// `require.extensions`; present for API compatibility,
    /// intentionally empty.
    pub extensions: Value,
}

impl Require {
    pub(crate) fn new(runtime: Weak<Runtime>, from: PathBuf, is_internal: bool) -> Self {
        Self {
            runtime,
            from,
            is_internal,
            cache: Value::object(),
            extensions: Value::object(),
        }
    }

    fn runtime(&self) -> Result<Rc<Runtime>, RuntimeError> {
        self.runtime.upgrade().ok_or(RuntimeError::Detached)
    }

    /// The path this require is scoped to.
    #[must_use]
    pub fn from(&self) -> &Path {
        &self.from
    }

    /// `require(name)`: module-or-mock for user modules, the internal
    /// path for runtime plumbing.
    pub fn call(&self, name: &str) -> Result<Value, RuntimeError> {
        let runtime = self.runtime()?;
        if self.is_internal {
            runtime.require_internal_module(&self.from, Some(name))
        } else {
            runtime.require_module_or_mock(&self.from, name)
        }
    }

    /// `require.requireActual(name)`: always the real module.
    pub fn require_actual(&self, name: &str) -> Result<Value, RuntimeError> {
        self.runtime()?
            .require_module(&self.from, Some(name), RequireOptions::default())
    }

    /// `require.requireMock(name)`: always the mock.
    pub fn require_mock(&self, name: &str) -> Result<Value, RuntimeError> {
        self.runtime()?.require_mock(&self.from, name)
    }

    /// `require.resolve(name)`: the resolved path, without loading.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, RuntimeError> {
        self.runtime()?.resolve_module_path(&self.from, Some(name))
    }
}

impl std::fmt::Debug for Require {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Require")
            .field("from", &self.from)
            .field("is_internal", &self.is_internal)
            .finish_non_exhaustive()
    }
}
