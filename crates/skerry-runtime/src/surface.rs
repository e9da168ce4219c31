//! The runtime control surface handed to executing modules.
//!
//! One instance per executing module, scoped to that module's path.
//! Every mutator returns the same receiver so calls compose:
//! `surface.mock("a", ...).unmock("b")`. That chaining is a contract
//! test code relies on, not decoration.

use crate::runtime::{MockFactory, MockOptions, Runtime};
use crate::value::{NativeFn, Value};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

/// Module-scoped control surface.
#[derive(Clone)]
pub struct Surface {
    runtime: Weak<Runtime>,
    from: PathBuf,
}

impl Surface {
    pub(crate) fn new(runtime: Weak<Runtime>, from: PathBuf) -> Self {
        Self { runtime, from }
    }

    fn with_runtime(&self, f: impl FnOnce(&Rc<Runtime>)) -> &Self {
        if let Some(runtime) = self.runtime.upgrade() {
            f(&runtime);
        }
        self
    }

    /// Mark `name` as mocked; with a factory, the factory supplies the
    /// mock, and `options.is_virtual` registers a module that need not
    /// exist on disk.
    pub fn mock(&self, name: &str, factory: Option<MockFactory>, options: MockOptions) -> &Self {
        self.with_runtime(|rt| match factory {
            Some(factory) => rt.set_mock(&self.from, name, factory, options),
            None => rt.mock(&self.from, name),
        })
    }

    /// Non-hoisted variant of [`Surface::mock`]; behaves identically at
    /// runtime.
    pub fn do_mock(&self, name: &str, factory: Option<MockFactory>, options: MockOptions) -> &Self {
        self.mock(name, factory, options)
    }

    /// Mark `name` as explicitly unmocked.
    pub fn unmock(&self, name: &str) -> &Self {
        self.with_runtime(|rt| rt.unmock(&self.from, name))
    }

    /// Alias of [`Surface::unmock`].
    pub fn dont_mock(&self, name: &str) -> &Self {
        self.unmock(name)
    }

    /// Unmock `name` and suppress automocking across its transitive
    /// dependencies.
    pub fn deep_unmock(&self, name: &str) -> &Self {
        self.with_runtime(|rt| rt.deep_unmock(&self.from, name))
    }

    pub fn enable_automock(&self) -> &Self {
        self.with_runtime(|rt| rt.set_automock(true))
    }

    pub fn disable_automock(&self) -> &Self {
        self.with_runtime(|rt| rt.set_automock(false))
    }

    /// Sugar for a constant-value mock.
    pub fn set_mock(&self, name: &str, value: Value) -> &Self {
        let factory: MockFactory = Rc::new(move || value.clone());
        self.mock(name, Some(factory), MockOptions::default())
    }

    /// Rebuild the module and mock registries empty and clear every mock
    /// function reachable from the sandbox global.
    pub fn reset_module_registry(&self) -> &Self {
        self.with_runtime(|rt| rt.reset_module_registry())
    }

    /// Forward matcher registration to the assertion framework installed
    /// on the sandbox global.
    pub fn add_matchers(&self, matchers: Value) -> &Self {
        self.with_runtime(|rt| {
            let Some(global) = rt.environment().global() else {
                return;
            };
            let register = global.get("jasmine").and_then(|j| j.get("addMatchers"));
            if let Some(f) = register.as_ref().and_then(Value::as_function) {
                f.call(std::slice::from_ref(&matchers));
            }
        })
    }

    /// A fresh mock function, optionally with a preset implementation.
    #[must_use]
    pub fn mock_fn(&self, implementation: Option<NativeFn>) -> Value {
        self.runtime
            .upgrade()
            .map(|rt| rt.mocker().mock_fn(implementation))
            .unwrap_or_default()
    }

    /// Shallow snapshot of the configured test environment data; caller
    /// mutations do not write back into the configuration.
    #[must_use]
    pub fn get_test_env_data(&self) -> Value {
        self.runtime
            .upgrade()
            .map(|rt| rt.test_env_data_snapshot())
            .unwrap_or_default()
    }

    // Timer controls, forwarded to the environment's fake-timer facility.

    pub fn use_fake_timers(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().use_fake_timers())
    }

    pub fn use_real_timers(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().use_real_timers())
    }

    pub fn clear_all_timers(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().clear_all_timers())
    }

    pub fn run_all_ticks(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().run_all_ticks())
    }

    pub fn run_all_immediates(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().run_all_immediates())
    }

    pub fn run_all_timers(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().run_all_timers())
    }

    pub fn run_only_pending_timers(&self) -> &Self {
        self.with_runtime(|rt| rt.environment().fake_timers().run_only_pending_timers())
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}
