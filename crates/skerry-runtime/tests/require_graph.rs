//! Integration tests for the require graph: caching, reset, circular
//! requires, JSON modules, core modules, and execution diagnostics.

use skerry_resolve::{HasteMap, Resolver, ResolverConfig};
use skerry_runtime::{
    CompiledModule, Environment, RequireOptions, Runtime, RuntimeConfig, RuntimeError,
    ScriptedTransformer, TestEnvironment, TransformError, TransformOptions, Transformer, Value,
    WrapperScope,
};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    env: Rc<TestEnvironment>,
    transformer: Rc<ScriptedTransformer>,
    runtime: Rc<Runtime>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_haste(HasteMap::new())
    }

    fn with_haste(haste: HasteMap) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let resolver = Rc::new(Resolver::new(Arc::new(haste), ResolverConfig::default()));
        let env = Rc::new(TestEnvironment::new());
        let transformer = Rc::new(ScriptedTransformer::new());
        let runtime = Runtime::new(
            RuntimeConfig::new(root.clone()),
            resolver,
            env.clone() as Rc<dyn Environment>,
            transformer.clone() as Rc<dyn Transformer>,
        )
        .unwrap();
        Self {
            _dir: dir,
            root,
            env,
            transformer,
            runtime,
        }
    }

    /// Create the file on disk and register its wrapper.
    fn add_module(
        &self,
        rel: &str,
        wrapper: impl Fn(&mut WrapperScope<'_>) -> Result<(), RuntimeError> + 'static,
    ) -> PathBuf {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        self.transformer.add_script(&path, wrapper);
        path
    }

    /// A plausible test-file path to require from; never executed itself.
    fn entry(&self) -> PathBuf {
        self.root.join("entry-test.js")
    }
}

#[test]
fn test_exports_identity_is_stable_across_requires() {
    let fx = Fixture::new();
    fx.add_module("answer.js", |scope| {
        scope.exports.set("answer", Value::Number(42.0));
        Ok(())
    });

    let entry = fx.entry();
    let first = fx
        .runtime
        .require_module(&entry, Some("./answer"), RequireOptions::default())
        .unwrap();
    let second = fx
        .runtime
        .require_module(&entry, Some("./answer"), RequireOptions::default())
        .unwrap();

    assert!(first.ref_eq(&second));
    assert_eq!(first.get("answer").and_then(|v| v.as_number()), Some(42.0));
}

#[test]
fn test_reset_module_registry_reexecutes_bodies() {
    let fx = Fixture::new();
    let counter = Rc::new(Cell::new(0u32));
    let seen = counter.clone();
    fx.add_module("counted.js", move |scope| {
        seen.set(seen.get() + 1);
        scope.exports.set("n", Value::Number(f64::from(seen.get())));
        Ok(())
    });

    let entry = fx.entry();
    let first = fx
        .runtime
        .require_module(&entry, Some("./counted"), RequireOptions::default())
        .unwrap();
    fx.runtime
        .require_module(&entry, Some("./counted"), RequireOptions::default())
        .unwrap();
    assert_eq!(counter.get(), 1, "cached require must not re-execute");

    fx.runtime.reset_module_registry();
    let second = fx
        .runtime
        .require_module(&entry, Some("./counted"), RequireOptions::default())
        .unwrap();
    assert_eq!(counter.get(), 2, "post-reset require must re-execute");
    assert!(!first.ref_eq(&second));
}

#[test]
fn test_circular_require_sees_partial_exports() {
    let fx = Fixture::new();
    fx.add_module("a.js", |scope| {
        scope
            .exports
            .set("v", Value::String("a-before".to_string()));
        let b = scope.require.call("./b")?;
        scope
            .exports
            .set("b_saw", b.get("saw_v").unwrap_or_default());
        scope.exports.set("v", Value::String("a-after".to_string()));
        Ok(())
    });
    fx.add_module("b.js", |scope| {
        let a = scope.require.call("./a")?;
        scope.exports.set("saw_v", a.get("v").unwrap_or_default());
        Ok(())
    });

    let a = fx
        .runtime
        .require_module(&fx.entry(), Some("./a"), RequireOptions::default())
        .unwrap();

    // The inner require observed the pre-assignment value; the caller
    // sees the post-assignment one.
    assert_eq!(a.get("v").and_then(|v| v.as_str().map(String::from)).as_deref(), Some("a-after"));
    assert_eq!(
        a.get("b_saw").and_then(|v| v.as_str().map(String::from)).as_deref(),
        Some("a-before")
    );
}

#[test]
fn test_json_modules_parse_and_cache() {
    let fx = Fixture::new();
    let path = fx.root.join("config.json");
    std::fs::write(&path, r#"{"name": "skerry", "retries": 3}"#).unwrap();

    let entry = fx.entry();
    let first = fx
        .runtime
        .require_module(&entry, Some("./config.json"), RequireOptions::default())
        .unwrap();
    assert_eq!(
        first.get("name").and_then(|v| v.as_str().map(String::from)).as_deref(),
        Some("skerry")
    );
    assert_eq!(first.get("retries").and_then(|v| v.as_number()), Some(3.0));

    let second = fx
        .runtime
        .require_module(&entry, Some("./config.json"), RequireOptions::default())
        .unwrap();
    assert!(first.ref_eq(&second));
}

#[test]
fn test_invalid_json_module_is_an_error() {
    let fx = Fixture::new();
    std::fs::write(fx.root.join("broken.json"), "{not json").unwrap();

    let err = fx
        .runtime
        .require_module(&fx.entry(), Some("./broken.json"), RequireOptions::default())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::JsonParse { .. }));
}

#[test]
fn test_native_addons_delegate_to_environment() {
    let fx = Fixture::new();
    std::fs::write(fx.root.join("binding.node"), "").unwrap();

    // The shipped environment has no native-addon loader.
    let err = fx
        .runtime
        .require_module(&fx.entry(), Some("./binding.node"), RequireOptions::default())
        .unwrap_err();
    assert!(matches!(err, RuntimeError::NativeAddon { .. }));
}

#[test]
fn test_core_modules_delegate_to_environment() {
    let fx = Fixture::new();
    let fs_exports = Value::object();
    fs_exports.set("readFile", Value::function("readFile", |_| Value::Undefined));
    fx.env.register_core_module("fs", fs_exports.clone());

    let entry = fx.entry();
    let first = fx
        .runtime
        .require_module(&entry, Some("fs"), RequireOptions::default())
        .unwrap();
    let second = fx
        .runtime
        .require_module(&entry, Some("fs"), RequireOptions::default())
        .unwrap();

    assert!(first.ref_eq(&fs_exports));
    assert!(first.ref_eq(&second));
}

#[test]
fn test_module_record_is_prefilled() {
    let fx = Fixture::new();
    fx.add_module("dep.js", |_| Ok(()));
    let dep_path = fx.root.join("dep.js");
    let observed_dep = dep_path.clone();
    fx.add_module("top.js", move |scope| {
        scope.require.call("./dep")?;
        let record = scope.module.borrow();
        scope.exports.set(
            "child_recorded",
            Value::Bool(record.children.contains(&observed_dep)),
        );
        scope
            .exports
            .set("has_paths", Value::Bool(!record.paths.is_empty()));
        scope
            .exports
            .set("no_parent", Value::Bool(record.parent.is_none()));
        Ok(())
    });

    let top = fx
        .runtime
        .require_module(&fx.entry(), Some("./top"), RequireOptions::default())
        .unwrap();
    assert_eq!(top.get("child_recorded").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(top.get("has_paths").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(top.get("no_parent").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn test_require_resolve_and_actual() {
    let fx = Fixture::new();
    fx.add_module("util.js", |scope| {
        scope.exports.set("kind", Value::String("real".to_string()));
        Ok(())
    });
    let util_path = fx.root.join("util.js");
    let expected = util_path.clone();
    fx.add_module("asker.js", move |scope| {
        let resolved = scope.require.resolve("./util")?;
        scope
            .exports
            .set("resolved_ok", Value::Bool(resolved == expected));
        let actual = scope.require.require_actual("./util")?;
        scope
            .exports
            .set("actual_kind", actual.get("kind").unwrap_or_default());
        Ok(())
    });

    let asker = fx
        .runtime
        .require_module(&fx.entry(), Some("./asker"), RequireOptions::default())
        .unwrap();
    assert_eq!(asker.get("resolved_ok").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        asker.get("actual_kind").and_then(|v| v.as_str().map(String::from)).as_deref(),
        Some("real")
    );
}

#[test]
fn test_missing_module_error_shape() {
    let fx = Fixture::new();
    let from = fx.root.join("src").join("x.js");
    std::fs::create_dir_all(from.parent().unwrap()).unwrap();

    let err = fx
        .runtime
        .require_module(&from, Some("nope"), RequireOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot find module 'nope' from 'x.js'");
    assert_eq!(err.code(), Some("MODULE_NOT_FOUND"));
}

#[test]
fn test_torn_down_environment_skips_execution() {
    let fx = Fixture::new();
    let counter = Rc::new(Cell::new(0u32));
    let seen = counter.clone();
    fx.add_module("late.js", move |scope| {
        seen.set(seen.get() + 1);
        scope.exports.set("ran", Value::Bool(true));
        Ok(())
    });

    fx.env.teardown();
    let exports = fx
        .runtime
        .require_module(&fx.entry(), Some("./late"), RequireOptions::default())
        .unwrap();

    // The shutdown race is silent: no execution, empty exports.
    assert_eq!(counter.get(), 0);
    assert!(exports.get("ran").is_none());
}

#[test]
fn test_haste_manual_mock_substitution_in_require_module() {
    let mut haste = HasteMap::new();
    // Registered under a path inside the fixture root, created below.
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let mock_path = root.join("__mocks__").join("shadowed.js");
    haste.add_mock("shadowed", &mock_path);

    let resolver = Rc::new(Resolver::new(Arc::new(haste), ResolverConfig::default()));
    let env = Rc::new(TestEnvironment::new());
    let transformer = Rc::new(ScriptedTransformer::new());
    let runtime = Runtime::new(
        RuntimeConfig::new(root.clone()),
        resolver,
        env as Rc<dyn Environment>,
        transformer.clone() as Rc<dyn Transformer>,
    )
    .unwrap();

    transformer.add_script(&mock_path, |scope| {
        scope.exports.set("mocked", Value::Bool(true));
        Ok(())
    });

    // No real module named `shadowed` exists anywhere, so requireModule
    // substitutes the manual mock.
    let entry = root.join("entry-test.js");
    let exports = runtime
        .require_module(&entry, Some("shadowed"), RequireOptions::default())
        .unwrap();
    assert_eq!(exports.get("mocked").and_then(|v| v.as_bool()), Some(true));

    // The internal path never substitutes; with no real module the
    // require fails outright.
    let err = runtime
        .require_internal_module(&entry, Some("shadowed"))
        .unwrap_err();
    assert_eq!(err.code(), Some("MODULE_NOT_FOUND"));
}

struct BrokenTransformer;

impl Transformer for BrokenTransformer {
    fn transform(
        &self,
        filename: &Path,
        _options: &TransformOptions,
    ) -> Result<CompiledModule, TransformError> {
        Err(TransformError::Syntax {
            path: filename.to_path_buf(),
            message: "unexpected token".to_string(),
        })
    }
}

#[test]
fn test_syntax_errors_are_rewrapped_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    std::fs::write(root.join("broken.js"), "").unwrap();

    let resolver = Rc::new(Resolver::new(
        Arc::new(HasteMap::new()),
        ResolverConfig::default(),
    ));
    let env = Rc::new(TestEnvironment::new());
    let runtime = Runtime::new(
        RuntimeConfig::new(root.clone()).with_preprocessor("ts-compiler"),
        resolver,
        env as Rc<dyn Environment>,
        Rc::new(BrokenTransformer) as Rc<dyn Transformer>,
    )
    .unwrap();

    let err = runtime
        .require_module(
            &root.join("entry-test.js"),
            Some("./broken"),
            RequireOptions::default(),
        )
        .unwrap_err();

    let text = err.to_string();
    assert!(matches!(err, RuntimeError::ModuleParse { .. }));
    // Project-relative path, not the absolute one.
    assert!(text.contains("broken.js"));
    assert!(!text.contains(root.to_str().unwrap()));
    assert!(text.contains("ts-compiler"));
}
