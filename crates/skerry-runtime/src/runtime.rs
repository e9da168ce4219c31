//! The per-test module runtime.
//!
//! Owns the lifetime of module and mock instances for one test: the
//! module registry (two-phase, so circular requires observe partial
//! exports), the mock registries and decision caches, and the execution
//! of compiled wrappers against the sandbox.

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::mock::{MockMetadata, ModuleMocker};
use crate::module::{ModuleHandle, ModuleRecord};
use crate::require::Require;
use crate::surface::Surface;
use crate::transform::{TransformError, TransformOptions, Transformer, WrapperScope};
use crate::value::Value;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use skerry_resolve::{ResolveModuleOptions, Resolver};
use std::cell::{Cell, RefCell};
use std::path::{Component, Path, PathBuf};
use std::rc::{Rc, Weak};

/// Separator inside normalized module IDs. The three slots
/// (`kind`, absolute path, mock path) are always present, so absent
/// components serialize as empty strings without ambiguity.
const ID_SEPARATOR: char = '\u{0}';

/// A user-supplied mock factory.
pub type MockFactory = Rc<dyn Fn() -> Value>;

/// Options for explicit mock registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockOptions {
    /// Register the module as virtual: it need not exist on disk.
    pub is_virtual: bool,
}

/// Per-require options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireOptions {
    /// Internal plumbing: bypasses manual-mock substitution and is
    /// forwarded to the transformer.
    pub is_internal_module: bool,
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Project root; used to relativize paths in diagnostics.
    pub root_dir: PathBuf,
    /// Whether automocking starts enabled.
    pub automock: bool,
    /// Paths matching any of these patterns are never automocked.
    /// Compiled once, joined with `|`.
    pub unmocked_module_path_patterns: Vec<String>,
    /// Data exposed to test code via the control surface.
    pub test_env_data: FxHashMap<String, Value>,
    /// Preprocessor name included in syntax-error diagnostics.
    pub preprocessor: Option<String>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            automock: false,
            unmocked_module_path_patterns: Vec::new(),
            test_env_data: FxHashMap::default(),
            preprocessor: None,
        }
    }

    #[must_use]
    pub fn with_automock(mut self, automock: bool) -> Self {
        self.automock = automock;
        self
    }

    #[must_use]
    pub fn with_unmocked_module_path_patterns(mut self, patterns: Vec<String>) -> Self {
        self.unmocked_module_path_patterns = patterns;
        self
    }

    #[must_use]
    pub fn with_test_env_data(mut self, data: FxHashMap<String, Value>) -> Self {
        self.test_env_data = data;
        self
    }

    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: impl Into<String>) -> Self {
        self.preprocessor = Some(preprocessor.into());
        self
    }
}

/// The per-test module runtime.
pub struct Runtime {
    /// Handle to the owning `Rc`, for minting per-module requires and
    /// control surfaces.
    self_handle: Weak<Runtime>,
    config: RuntimeConfig,
    resolver: Rc<Resolver>,
    environment: Rc<dyn Environment>,
    transformer: Rc<dyn Transformer>,
    mocker: ModuleMocker,
    unmock_regex: Option<Regex>,
    automock: Cell<bool>,

    // Registries. All per-instance; the runtime is single-threaded
    // cooperative, so each table sits behind its own RefCell and no
    // borrow is held across re-entrant requires.
    module_registry: RefCell<FxHashMap<PathBuf, ModuleHandle>>,
    mock_registry: RefCell<FxHashMap<String, Value>>,
    mock_factories: RefCell<FxHashMap<String, MockFactory>>,
    explicit_should_mock: RefCell<FxHashMap<String, bool>>,
    transitive_should_mock: RefCell<FxHashMap<String, bool>>,
    should_mock_cache: RefCell<FxHashMap<String, bool>>,
    should_unmock_transitive_deps_cache: RefCell<FxHashMap<String, bool>>,
    mock_metadata_cache: RefCell<FxHashMap<PathBuf, MockMetadata>>,
    virtual_mocks: RefCell<FxHashSet<PathBuf>>,
    normalized_id_cache: RefCell<FxHashMap<String, String>>,

    // The explicit execution stack: saved and restored around every
    // wrapper invocation.
    current_module: RefCell<Option<PathBuf>>,
    current_manual_mock: RefCell<Option<PathBuf>>,
}

impl Runtime {
    /// Build a runtime. Fails only if an unmocked-module path pattern is
    /// not a valid regex.
    pub fn new(
        config: RuntimeConfig,
        resolver: Rc<Resolver>,
        environment: Rc<dyn Environment>,
        transformer: Rc<dyn Transformer>,
    ) -> Result<Rc<Self>, RuntimeError> {
        let unmock_regex = if config.unmocked_module_path_patterns.is_empty() {
            None
        } else {
            Some(Regex::new(
                &config.unmocked_module_path_patterns.join("|"),
            )?)
        };
        let automock = Cell::new(config.automock);

        Ok(Rc::new_cyclic(|self_handle| Self {
            self_handle: self_handle.clone(),
            config,
            resolver,
            environment,
            transformer,
            mocker: ModuleMocker::new(),
            unmock_regex,
            automock,
            module_registry: RefCell::new(FxHashMap::default()),
            mock_registry: RefCell::new(FxHashMap::default()),
            mock_factories: RefCell::new(FxHashMap::default()),
            explicit_should_mock: RefCell::new(FxHashMap::default()),
            transitive_should_mock: RefCell::new(FxHashMap::default()),
            should_mock_cache: RefCell::new(FxHashMap::default()),
            should_unmock_transitive_deps_cache: RefCell::new(FxHashMap::default()),
            mock_metadata_cache: RefCell::new(FxHashMap::default()),
            virtual_mocks: RefCell::new(FxHashSet::default()),
            normalized_id_cache: RefCell::new(FxHashMap::default()),
            current_module: RefCell::new(None),
            current_manual_mock: RefCell::new(None),
        }))
    }

    pub(crate) fn environment(&self) -> &Rc<dyn Environment> {
        &self.environment
    }

    pub(crate) fn mocker(&self) -> &ModuleMocker {
        &self.mocker
    }

    /// The resolver this runtime consults.
    #[must_use]
    pub fn resolver(&self) -> &Rc<Resolver> {
        &self.resolver
    }

    // ------------------------------------------------------------------
    // Require entry points
    // ------------------------------------------------------------------

    /// Require the real module `name` as seen from `from`. With no name,
    /// `from` itself is the module (the test entry point).
    pub fn require_module(
        &self,
        from: &Path,
        name: Option<&str>,
        options: RequireOptions,
    ) -> Result<Value, RuntimeError> {
        let mut module_path: Option<PathBuf> = None;

        if let Some(name) = name {
            // A haste manual mock shadows a module that has no haste
            // module entry of its own, unless that mock is what is
            // executing right now or the caller explicitly unmocked it.
            if !options.is_internal_module && self.resolver.get_module(name).is_none() {
                if let Some(manual_mock) = self.resolver.get_mock_module(from, name) {
                    let executing = self
                        .current_manual_mock
                        .borrow()
                        .as_deref()
                        .is_some_and(|p| p == manual_mock.as_path());
                    let module_id = self.normalize_id(from, Some(name));
                    let explicitly_unmocked =
                        self.explicit_should_mock.borrow().get(&module_id) == Some(&false);
                    if !executing && !explicitly_unmocked {
                        module_path = Some(manual_mock);
                    }
                }
            }

            if self.resolver.is_core_module(name) {
                return Ok(self.environment.core_module(name));
            }
        }

        let module_path = match module_path {
            Some(path) => path,
            None => self.resolve_module_path(from, name)?,
        };

        let registered = self
            .module_registry
            .borrow()
            .get(&module_path)
            .map(Rc::clone);
        let handle = if let Some(handle) = registered {
            handle
        } else {
            tracing::debug!(path = %module_path.display(), "loading module");
            // Two-phase: the record enters the registry before its body
            // runs, so a circular require returns the partial exports.
            let handle = ModuleRecord::new(module_path.clone());
            self.module_registry
                .borrow_mut()
                .insert(module_path.clone(), Rc::clone(&handle));
            self.load_module(&handle, &module_path, options)?;
            handle
        };

        self.record_child(from, &module_path);

        let exports = handle.borrow().exports.clone();
        Ok(exports)
    }

    /// Require runtime plumbing: never intercepted by user mocks.
    pub fn require_internal_module(
        &self,
        from: &Path,
        name: Option<&str>,
    ) -> Result<Value, RuntimeError> {
        self.require_module(
            from,
            name,
            RequireOptions {
                is_internal_module: true,
            },
        )
    }

    /// Require the mock for `name` as seen from `from`.
    pub fn require_mock(&self, from: &Path, name: &str) -> Result<Value, RuntimeError> {
        let module_id = self.normalize_id(from, Some(name));

        if let Some(mock) = self.mock_registry.borrow().get(&module_id) {
            return Ok(mock.clone());
        }

        if let Some(factory) = self.mock_factories.borrow().get(&module_id).cloned() {
            let mock = factory();
            self.mock_registry
                .borrow_mut()
                .insert(module_id, mock.clone());
            return Ok(mock);
        }

        let mut manual_mock = self.resolver.get_mock_module(from, name);
        if manual_mock.is_none() {
            // Probe for a `__mocks__/<basename>` sibling of the real
            // module.
            let real_path = self.resolve_module_path(from, Some(name))?;
            if let (Some(dir), Some(file_name)) = (real_path.parent(), real_path.file_name()) {
                let candidate = dir.join("__mocks__").join(file_name);
                if candidate.is_file() {
                    manual_mock = Some(candidate);
                }
            }
        }

        let mock = if let Some(mock_path) = manual_mock {
            tracing::debug!(path = %mock_path.display(), "executing manual mock");
            let handle = ModuleRecord::new(mock_path);
            self.exec_module(&handle, RequireOptions::default())?;
            let exports = handle.borrow().exports.clone();
            exports
        } else {
            self.generate_mock(from, name)?
        };

        self.mock_registry
            .borrow_mut()
            .insert(module_id, mock.clone());
        Ok(mock)
    }

    /// Require either the real module or its mock, per the mock-decision
    /// policy.
    pub fn require_module_or_mock(
        &self,
        from: &Path,
        name: &str,
    ) -> Result<Value, RuntimeError> {
        if self.should_mock(from, name)? {
            self.require_mock(from, name)
        } else {
            self.require_module(from, Some(name), RequireOptions::default())
        }
    }

    /// Rebuild the module and mock registries empty, clear every mock
    /// function reachable from the sandbox global, and reset the timer
    /// facility's bookkeeping.
    pub fn reset_module_registry(&self) {
        self.module_registry.replace(FxHashMap::default());
        self.mock_registry.replace(FxHashMap::default());

        if let Some(global) = self.environment.global() {
            if let Value::Object(map) = &global {
                for value in map.borrow().values() {
                    if let Some(function) = value.as_function() {
                        if function.is_mock() {
                            function.mock_clear();
                        }
                    }
                }
            }
            self.environment.fake_timers().mock_clear_timers();
        }
    }

    // ------------------------------------------------------------------
    // Explicit mock registration
    // ------------------------------------------------------------------

    /// Mark `name` as explicitly mocked.
    pub fn mock(&self, from: &Path, name: &str) {
        let module_id = self.normalize_id(from, Some(name));
        self.explicit_should_mock.borrow_mut().insert(module_id, true);
    }

    /// Mark `name` as explicitly unmocked.
    pub fn unmock(&self, from: &Path, name: &str) {
        let module_id = self.normalize_id(from, Some(name));
        self.explicit_should_mock
            .borrow_mut()
            .insert(module_id, false);
    }

    /// Unmock `name` and suppress automocking of its transitive
    /// dependencies.
    pub fn deep_unmock(&self, from: &Path, name: &str) {
        let module_id = self.normalize_id(from, Some(name));
        self.explicit_should_mock
            .borrow_mut()
            .insert(module_id.clone(), false);
        self.transitive_should_mock
            .borrow_mut()
            .insert(module_id, false);
    }

    /// Install a mock factory for `name` and mark it explicitly mocked.
    /// A virtual registration must land before the normalized ID is
    /// computed, so the ID picks up the virtual path.
    pub fn set_mock(&self, from: &Path, name: &str, factory: MockFactory, options: MockOptions) {
        if options.is_virtual {
            self.virtual_mocks
                .borrow_mut()
                .insert(virtual_mock_path(from, name));
        }
        let module_id = self.normalize_id(from, Some(name));
        self.mock_factories
            .borrow_mut()
            .insert(module_id.clone(), factory);
        self.explicit_should_mock.borrow_mut().insert(module_id, true);
    }

    /// Toggle global automocking.
    pub fn set_automock(&self, automock: bool) {
        self.automock.set(automock);
    }

    /// Shallow snapshot of the configured test environment data.
    #[must_use]
    pub fn test_env_data_snapshot(&self) -> Value {
        let snapshot = Value::object();
        for (key, value) in &self.config.test_env_data {
            snapshot.set(key.clone(), value.clone());
        }
        snapshot
    }

    // ------------------------------------------------------------------
    // Mock decision
    // ------------------------------------------------------------------

    /// Decide whether `(from, name)` gets the mock. Deterministic and
    /// idempotent given the registries and config.
    pub fn should_mock(&self, from: &Path, name: &str) -> Result<bool, RuntimeError> {
        // 1. Virtual mocks always mock.
        if self
            .virtual_mocks
            .borrow()
            .contains(&virtual_mock_path(from, name))
        {
            return Ok(true);
        }

        // 2. An explicit flag wins.
        let module_id = self.normalize_id(from, Some(name));
        if let Some(&explicit) = self.explicit_should_mock.borrow().get(&module_id) {
            return Ok(explicit);
        }

        // 3. Automock off, core module, or suppressed pair.
        if !self.automock.get() || self.resolver.is_core_module(name) {
            return Ok(false);
        }
        let deps_key = format!("{}{ID_SEPARATOR}{}", from.display(), module_id);
        if self
            .should_unmock_transitive_deps_cache
            .borrow()
            .get(&deps_key)
            == Some(&true)
        {
            return Ok(false);
        }

        // 4. Memoized decision.
        if let Some(&hit) = self.should_mock_cache.borrow().get(&module_id) {
            return Ok(hit);
        }

        // 5. Resolution failure is tolerable only when a manual mock
        // covers the name.
        let resolved = match self
            .resolver
            .resolve_module(from, name, ResolveModuleOptions::default())
        {
            Ok(path) => path,
            Err(err) => {
                if self.resolver.get_mock_module(from, name).is_some() {
                    self.should_mock_cache.borrow_mut().insert(module_id, true);
                    return Ok(true);
                }
                return Err(err.into());
            }
        };

        // 6. The unmock list exempts the resolved path.
        if let Some(regex) = &self.unmock_regex {
            if regex.is_match(&resolved.to_string_lossy()) {
                self.should_mock_cache.borrow_mut().insert(module_id, false);
                return Ok(false);
            }
        }

        // 7. Transitive unmock across flat installs: an unmocked caller
        // inside node_modules does not re-mock the packages it pulls in.
        let current_module_id = self.normalize_id(from, None);
        let transitive_off =
            self.transitive_should_mock.borrow().get(&current_module_id) == Some(&false);
        let both_installed = is_in_module_directory(from) && is_in_module_directory(&resolved);
        let caller_unmocked = self
            .unmock_regex
            .as_ref()
            .is_some_and(|r| r.is_match(&from.to_string_lossy()))
            || self.explicit_should_mock.borrow().get(&current_module_id) == Some(&false);
        if transitive_off || (both_installed && caller_unmocked) {
            self.transitive_should_mock
                .borrow_mut()
                .insert(module_id, false);
            self.should_unmock_transitive_deps_cache
                .borrow_mut()
                .insert(deps_key, true);
            return Ok(false);
        }

        // 8. Default: mock.
        self.should_mock_cache.borrow_mut().insert(module_id, true);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Module identity
    // ------------------------------------------------------------------

    /// The canonical identity of a `(caller, requested name)` pair,
    /// fusing the real-module path and the mock path so a mocked module
    /// and its original share registry identity. Memoized per raw pair.
    pub fn normalize_id(&self, from: &Path, name: Option<&str>) -> String {
        let raw_key = format!(
            "{}{ID_SEPARATOR}{}",
            from.display(),
            name.unwrap_or_default()
        );
        if let Some(hit) = self.normalized_id_cache.borrow().get(&raw_key) {
            return hit.clone();
        }

        let id = match name {
            Some(name) if self.resolver.is_core_module(name) => {
                format!("node{ID_SEPARATOR}{name}{ID_SEPARATOR}")
            }
            Some(name) => {
                let virtual_path = virtual_mock_path(from, name);
                let absolute = if self.virtual_mocks.borrow().contains(&virtual_path) {
                    Some(virtual_path)
                } else {
                    self.resolver
                        .resolve_module(from, name, ResolveModuleOptions::default())
                        .ok()
                };
                let mock_path = self.resolver.get_mock_module(from, name);
                user_id(absolute.as_deref(), mock_path.as_deref())
            }
            None => user_id(Some(from), None),
        };

        self.normalized_id_cache
            .borrow_mut()
            .insert(raw_key, id.clone());
        id
    }

    /// Resolve without loading. With no name, `from` itself is the
    /// module.
    pub(crate) fn resolve_module_path(
        &self,
        from: &Path,
        name: Option<&str>,
    ) -> Result<PathBuf, RuntimeError> {
        match name {
            Some(name) => Ok(self
                .resolver
                .resolve_module(from, name, ResolveModuleOptions::default())?),
            None => Ok(from.to_path_buf()),
        }
    }

    // ------------------------------------------------------------------
    // Loading and execution
    // ------------------------------------------------------------------

    fn load_module(
        &self,
        handle: &ModuleHandle,
        module_path: &Path,
        options: RequireOptions,
    ) -> Result<(), RuntimeError> {
        let extension = module_path.extension().and_then(std::ffi::OsStr::to_str);
        match extension {
            Some("json") => {
                let content =
                    std::fs::read_to_string(module_path).map_err(|source| {
                        RuntimeError::ModuleRead {
                            path: module_path.to_path_buf(),
                            source,
                        }
                    })?;
                let parsed: serde_json::Value =
                    serde_json::from_str(&content).map_err(|source| RuntimeError::JsonParse {
                        path: module_path.to_path_buf(),
                        source,
                    })?;
                handle.borrow_mut().exports = Value::from_json(&parsed);
                Ok(())
            }
            Some("node") => {
                handle.borrow_mut().exports = self.environment.load_native_addon(module_path)?;
                Ok(())
            }
            _ => self.exec_module(handle, options),
        }
    }

    /// Execute a compiled wrapper against the sandbox.
    fn exec_module(
        &self,
        handle: &ModuleHandle,
        options: RequireOptions,
    ) -> Result<(), RuntimeError> {
        let Some(global) = self.environment.global() else {
            // The sandbox is being torn down; losing this evaluation is
            // the intended shutdown behavior.
            return Ok(());
        };

        let filename = handle.borrow().filename.clone();
        let dirname = filename
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let previous_module = self.current_module.replace(Some(filename.clone()));
        let previous_manual_mock = self.current_manual_mock.replace(Some(filename.clone()));

        let require = Require::new(
            self.self_handle.clone(),
            filename.clone(),
            options.is_internal_module,
        );
        {
            let mut record = handle.borrow_mut();
            record.parent = previous_module.clone();
            record.paths = self.resolver.get_module_paths(&dirname);
            record.require = Some(require.clone());
        }

        let result = self.transform_and_run(handle, &filename, &dirname, require, global, options);

        // Restore the execution stack on success and error alike.
        self.current_module.replace(previous_module);
        self.current_manual_mock.replace(previous_manual_mock);
        result
    }

    fn transform_and_run(
        &self,
        handle: &ModuleHandle,
        filename: &Path,
        dirname: &Path,
        require: Require,
        global: Value,
        options: RequireOptions,
    ) -> Result<(), RuntimeError> {
        let compiled = self
            .transformer
            .transform(
                filename,
                &TransformOptions {
                    is_internal_module: options.is_internal_module,
                },
            )
            .map_err(|err| self.rewrap_transform_error(err))?;

        let exports = handle.borrow().exports.clone();
        let mut scope = WrapperScope {
            module: Rc::clone(handle),
            exports,
            require,
            dirname,
            filename,
            global,
            surface: Surface::new(self.self_handle.clone(), filename.to_path_buf()),
        };
        (compiled.wrapper)(&mut scope)
    }

    fn rewrap_transform_error(&self, err: TransformError) -> RuntimeError {
        match err {
            TransformError::Syntax { path, message } => {
                let path = path
                    .strip_prefix(&self.config.root_dir)
                    .map_or(path.clone(), Path::to_path_buf);
                RuntimeError::ModuleParse {
                    path,
                    message,
                    preprocessor: self.config.preprocessor.clone(),
                }
            }
            other => RuntimeError::Transform(other),
        }
    }

    /// Synthesize an automock for `name`: evaluate the real module in an
    /// isolated registry world, introspect the result, and generate a
    /// fresh mock from the recorded shape.
    fn generate_mock(&self, from: &Path, name: &str) -> Result<Value, RuntimeError> {
        let real_path = self.resolve_module_path(from, Some(name))?;

        if !self.mock_metadata_cache.borrow().contains_key(&real_path) {
            // Sentinel first, so a circular reference met during the
            // isolated evaluation terminates with an empty shape.
            self.mock_metadata_cache
                .borrow_mut()
                .insert(real_path.clone(), MockMetadata::empty_object());

            // A module evaluated only to be introspected must not leak
            // records into the main registries.
            let saved_modules = self.module_registry.replace(FxHashMap::default());
            let saved_mocks = self.mock_registry.replace(FxHashMap::default());
            let result = self.require_module(from, Some(name), RequireOptions::default());
            self.module_registry.replace(saved_modules);
            self.mock_registry.replace(saved_mocks);
            let exports = result?;

            let metadata =
                self.mocker
                    .get_metadata(&exports)
                    .ok_or_else(|| RuntimeError::MockMetadata {
                        path: real_path.clone(),
                    })?;
            self.mock_metadata_cache
                .borrow_mut()
                .insert(real_path.clone(), metadata);
        }

        let generated = self
            .mock_metadata_cache
            .borrow()
            .get(&real_path)
            .map(|metadata| self.mocker.generate_from_metadata(metadata));
        generated.ok_or(RuntimeError::MockMetadata { path: real_path })
    }

    /// Note `module_path` as a child of the requiring module, when that
    /// module has a record.
    fn record_child(&self, from: &Path, module_path: &Path) {
        if from == module_path {
            return;
        }
        if let Some(parent) = self.module_registry.borrow().get(from) {
            let mut record = parent.borrow_mut();
            if !record.children.iter().any(|c| c == module_path) {
                record.children.push(module_path.to_path_buf());
            }
        }
    }
}

/// The in-memory path a virtual mock for `(from, name)` lives at.
fn virtual_mock_path(from: &Path, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        normalize_path(path)
    } else {
        let dirname = from.parent().unwrap_or_else(|| Path::new("."));
        normalize_path(&dirname.join(name))
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other),
        }
    }
    result.iter().collect()
}

/// Whether `path` has a `node_modules` component.
fn is_in_module_directory(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"))
}

fn user_id(absolute: Option<&Path>, mock_path: Option<&Path>) -> String {
    format!(
        "user{ID_SEPARATOR}{}{ID_SEPARATOR}{}",
        absolute.map(|p| p.display().to_string()).unwrap_or_default(),
        mock_path
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_mock_path_resolution() {
        assert_eq!(
            virtual_mock_path(Path::new("/p/src/a.js"), "./widget"),
            PathBuf::from("/p/src/widget")
        );
        assert_eq!(
            virtual_mock_path(Path::new("/p/src/a.js"), "../widget"),
            PathBuf::from("/p/widget")
        );
        assert_eq!(
            virtual_mock_path(Path::new("/p/src/a.js"), "/abs/widget"),
            PathBuf::from("/abs/widget")
        );
        // Bare names land next to the caller.
        assert_eq!(
            virtual_mock_path(Path::new("/p/src/a.js"), "widget"),
            PathBuf::from("/p/src/widget")
        );
    }

    #[test]
    fn test_is_in_module_directory() {
        assert!(is_in_module_directory(Path::new("/p/node_modules/lib/a.js")));
        assert!(!is_in_module_directory(Path::new("/p/src/a.js")));
    }

    #[test]
    fn test_user_id_slots() {
        let id = user_id(Some(Path::new("/p/a.js")), None);
        assert_eq!(id, format!("user{ID_SEPARATOR}/p/a.js{ID_SEPARATOR}"));

        let id = user_id(None, Some(Path::new("/p/__mocks__/a.js")));
        assert_eq!(
            id,
            format!("user{ID_SEPARATOR}{ID_SEPARATOR}/p/__mocks__/a.js")
        );
    }
}
