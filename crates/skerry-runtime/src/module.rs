//! Module records.

use crate::require::Require;
use crate::value::Value;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Shared handle to a module record.
///
/// The registry, the wrapper scope, and any requiring module all hold
/// the same record, so exports assigned during execution are visible to
/// every holder (including a circular require that observed the record
/// mid-execution).
pub type ModuleHandle = Rc<RefCell<ModuleRecord>>;

/// One evaluated (or evaluating) module.
#[derive(Debug)]
pub struct ModuleRecord {
    /// Absolute path of the module file.
    pub filename: PathBuf,
    /// The exports object; starts empty and is registered before the
    /// module body runs.
    pub exports: Value,
    /// Paths of modules this module required.
    pub children: Vec<PathBuf>,
    /// The module that was executing when this one was created.
    pub parent: Option<PathBuf>,
    /// Upward `node_modules` walk from this module's directory.
    pub paths: Vec<PathBuf>,
    /// The per-module require; installed just before execution.
    pub require: Option<Require>,
}

impl ModuleRecord {
    /// Fresh record with empty exports, ready for two-phase
    /// registration.
    #[must_use]
    pub fn new(filename: PathBuf) -> ModuleHandle {
        Rc::new(RefCell::new(Self {
            filename,
            exports: Value::object(),
            children: Vec::new(),
            parent: None,
            paths: Vec::new(),
            require: None,
        }))
    }
}
