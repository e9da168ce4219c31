//! The sandbox host consumed by the runtime.
//!
//! The runtime only observes the host through this trait: the global
//! object (gone once the sandbox is torn down), the fake-timer facility,
//! and the host loaders for built-ins and native addons.

use crate::error::RuntimeError;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::Path;

/// Fake-timer controls exposed by the sandbox.
pub trait FakeTimers {
    fn use_fake_timers(&self);
    fn use_real_timers(&self);
    fn clear_all_timers(&self);
    fn run_all_ticks(&self);
    fn run_all_immediates(&self);
    fn run_all_timers(&self);
    fn run_only_pending_timers(&self);

    /// Invoked on registry reset. Optional.
    fn mock_clear_timers(&self) {}
}

/// The sandbox host.
pub trait Environment {
    /// The sandbox global object, or `None` once the environment has
    /// been torn down.
    fn global(&self) -> Option<Value>;

    fn fake_timers(&self) -> &dyn FakeTimers;

    /// Host built-in loader. Built-ins are returned as-is: no caching,
    /// no wrapping, no mocking.
    fn core_module(&self, name: &str) -> Value {
        let _ = name;
        Value::Undefined
    }

    /// Host native-addon loader for `.node` files.
    fn load_native_addon(&self, path: &Path) -> Result<Value, RuntimeError> {
        Err(RuntimeError::NativeAddon {
            path: path.to_path_buf(),
        })
    }
}

/// Timer facade that records which controls were invoked, in order.
#[derive(Debug, Default)]
pub struct CountingTimers {
    calls: RefCell<Vec<&'static str>>,
}

impl CountingTimers {
    fn record(&self, name: &'static str) {
        self.calls.borrow_mut().push(name);
    }

    /// The control invocations seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl FakeTimers for CountingTimers {
    fn use_fake_timers(&self) {
        self.record("useFakeTimers");
    }

    fn use_real_timers(&self) {
        self.record("useRealTimers");
    }

    fn clear_all_timers(&self) {
        self.record("clearAllTimers");
    }

    fn run_all_ticks(&self) {
        self.record("runAllTicks");
    }

    fn run_all_immediates(&self) {
        self.record("runAllImmediates");
    }

    fn run_all_timers(&self) {
        self.record("runAllTimers");
    }

    fn run_only_pending_timers(&self) {
        self.record("runOnlyPendingTimers");
    }

    fn mock_clear_timers(&self) {
        self.record("mockClearTimers");
    }
}

/// In-process environment with a real global object and teardown
/// support. The shipped default host, also used by the test suite.
#[derive(Debug)]
pub struct TestEnvironment {
    global: RefCell<Option<Value>>,
    timers: CountingTimers,
    core_modules: RefCell<FxHashMap<String, Value>>,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: RefCell::new(Some(Value::object())),
            timers: CountingTimers::default(),
            core_modules: RefCell::new(FxHashMap::default()),
        }
    }

    /// Tear the sandbox down; `global()` returns `None` afterwards.
    pub fn teardown(&self) {
        self.global.replace(None);
    }

    /// Register the exports served for a host built-in.
    pub fn register_core_module(&self, name: impl Into<String>, exports: Value) {
        self.core_modules.borrow_mut().insert(name.into(), exports);
    }

    /// The recording timer facade, for assertions.
    #[must_use]
    pub fn timers(&self) -> &CountingTimers {
        &self.timers
    }
}

impl Environment for TestEnvironment {
    fn global(&self) -> Option<Value> {
        self.global.borrow().clone()
    }

    fn fake_timers(&self) -> &dyn FakeTimers {
        &self.timers
    }

    fn core_module(&self, name: &str) -> Value {
        let name = name.strip_prefix("node:").unwrap_or(name);
        self.core_modules
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_drops_global() {
        let env = TestEnvironment::new();
        assert!(env.global().is_some());
        env.teardown();
        assert!(env.global().is_none());
    }

    #[test]
    fn test_global_is_shared() {
        let env = TestEnvironment::new();
        let a = env.global().unwrap();
        a.set("flag", Value::Bool(true));
        let b = env.global().unwrap();
        assert_eq!(b.get("flag").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_core_module_registry() {
        let env = TestEnvironment::new();
        let exports = Value::object();
        exports.set("sep", Value::String("/".to_string()));
        env.register_core_module("path", exports);

        assert!(env.core_module("path").get("sep").is_some());
        assert!(env.core_module("node:path").get("sep").is_some());
        assert!(env.core_module("fs").is_undefined());
    }

    #[test]
    fn test_timers_record_calls() {
        let env = TestEnvironment::new();
        env.fake_timers().use_fake_timers();
        env.fake_timers().run_all_timers();
        assert_eq!(env.timers().calls(), vec!["useFakeTimers", "runAllTimers"]);
    }
}
