//! Standard node-style resolution.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`
//! - Absolute filesystem specifiers
//! - Bare specifiers via the module-directory ancestor walk
//! - Extension probing
//! - Directory resolution (`package.json` main, `index.*`)
//! - Browser-field redirect when the browser flag is set
//! - Extra search roots (`NODE_PATH` entries and configured module paths)

use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Inputs threaded through one resolution attempt.
#[derive(Debug, Clone)]
pub struct NodeResolutionOptions<'a> {
    /// Directory containing the requiring file.
    pub basedir: &'a Path,
    /// Extensions to probe, in order.
    pub extensions: &'a [String],
    /// Directory names crossed during the ancestor walk.
    pub module_directories: &'a [String],
    /// Extra search roots tried after the ancestor walk.
    pub paths: &'a [PathBuf],
    /// Prefer `package.json` `browser` over `main`.
    pub browser: bool,
}

/// Resolve `name` against `opts.basedir`, returning the selected file.
#[must_use]
pub fn resolve(name: &str, opts: &NodeResolutionOptions<'_>) -> Option<PathBuf> {
    if name.starts_with("./") || name.starts_with("../") {
        let base = normalize_path(&opts.basedir.join(name));
        return resolve_file_or_directory(&base, opts);
    }

    if Path::new(name).is_absolute() {
        let base = normalize_path(Path::new(name));
        return resolve_file_or_directory(&base, opts);
    }

    resolve_bare(name, opts)
}

/// Resolve a path that might be a file or a directory.
#[must_use]
pub fn resolve_file_or_directory(base: &Path, opts: &NodeResolutionOptions<'_>) -> Option<PathBuf> {
    resolve_as_file(base, opts).or_else(|| resolve_as_directory(base, opts))
}

/// Normalize a path by resolving `.` and `..` components without
/// filesystem access.
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

/// Try `base` exactly, then with each extension appended.
fn resolve_as_file(base: &Path, opts: &NodeResolutionOptions<'_>) -> Option<PathBuf> {
    if base.is_file() {
        return Some(canonical(base));
    }

    let file_name = base.file_name()?;
    for ext in opts.extensions {
        let mut name = file_name.to_os_string();
        name.push(ext.as_str());
        let candidate = base.with_file_name(&name);
        if candidate.is_file() {
            return Some(canonical(&candidate));
        }
    }

    None
}

/// Resolve a directory: `package.json` entry field, then `index.*`.
fn resolve_as_directory(dir: &Path, opts: &NodeResolutionOptions<'_>) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let pkg_json_path = dir.join("package.json");
    if pkg_json_path.is_file() {
        if let Some(entry) = package_entry_field(&pkg_json_path, opts.browser) {
            let target = normalize_path(&dir.join(&entry));
            if let Some(found) = resolve_as_file(&target, opts) {
                return Some(found);
            }
            if let Some(found) = resolve_index(&target, opts) {
                return Some(found);
            }
        }
    }

    resolve_index(dir, opts)
}

/// Probe `dir/index.<ext>` for each configured extension.
fn resolve_index(dir: &Path, opts: &NodeResolutionOptions<'_>) -> Option<PathBuf> {
    for ext in opts.extensions {
        let index = dir.join(format!("index{ext}"));
        if index.is_file() {
            return Some(canonical(&index));
        }
    }
    None
}

/// Read the entry field out of a `package.json`.
///
/// With the browser flag set, a string `browser` field takes precedence
/// over `main`. An object-valued `browser` field (per-file redirects) is
/// ignored and `main` is used.
fn package_entry_field(pkg_json_path: &Path, browser: bool) -> Option<String> {
    let content = std::fs::read_to_string(pkg_json_path).ok()?;
    let pkg_json: Value = serde_json::from_str(&content).ok()?;

    if browser {
        if let Some(field) = pkg_json.get("browser").and_then(Value::as_str) {
            return Some(field.to_string());
        }
    }

    pkg_json
        .get("main")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Resolve a bare specifier: walk ancestors crossing every configured
/// module directory, then try the extra search roots.
fn resolve_bare(name: &str, opts: &NodeResolutionOptions<'_>) -> Option<PathBuf> {
    let mut current = Some(opts.basedir);
    while let Some(dir) = current {
        for module_dir in opts.module_directories {
            // Skip `node_modules/node_modules` style candidates
            if dir.file_name().is_some_and(|n| *n == **module_dir) {
                continue;
            }
            let candidate = dir.join(module_dir).join(name);
            if let Some(found) = resolve_file_or_directory(&candidate, opts) {
                return Some(found);
            }
        }
        current = dir.parent();
    }

    for root in opts.paths {
        let candidate = root.join(name);
        if let Some(found) = resolve_file_or_directory(&candidate, opts) {
            return Some(found);
        }
    }

    None
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn opts<'a>(basedir: &'a Path, extensions: &'a [String]) -> NodeResolutionOptions<'a> {
        let module_directories: &'static [String] =
            Box::leak(vec!["node_modules".to_string()].into_boxed_slice());
        NodeResolutionOptions {
            basedir,
            extensions,
            module_directories,
            paths: &[],
            browser: false,
        }
    }

    fn js_exts() -> Vec<String> {
        vec![".js".to_string(), ".json".to_string()]
    }

    #[test]
    fn test_relative_with_extension_probing() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("utils.js"), "").unwrap();

        let exts = js_exts();
        let resolved = resolve("./utils", &opts(&root, &exts)).unwrap();
        assert_eq!(resolved, root.join("utils.js"));
    }

    #[test]
    fn test_exact_file_beats_probing() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("data.json"), "{}").unwrap();
        fs::write(root.join("data.json.js"), "").unwrap();

        let exts = js_exts();
        let resolved = resolve("./data.json", &opts(&root, &exts)).unwrap();
        assert_eq!(resolved, root.join("data.json"));
    }

    #[test]
    fn test_directory_index() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("lib")).unwrap();
        fs::write(root.join("lib").join("index.js"), "").unwrap();

        let exts = js_exts();
        let resolved = resolve("./lib", &opts(&root, &exts)).unwrap();
        assert_eq!(resolved, root.join("lib").join("index.js"));
    }

    #[test]
    fn test_package_main_field() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let pkg = root.join("node_modules").join("dep");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("package.json"), r#"{"main": "lib/entry.js"}"#).unwrap();
        fs::write(pkg.join("lib").join("entry.js"), "").unwrap();

        let from = root.join("src");
        fs::create_dir(&from).unwrap();

        let exts = js_exts();
        let resolved = resolve("dep", &opts(&from, &exts)).unwrap();
        assert_eq!(resolved, pkg.join("lib").join("entry.js"));
    }

    #[test]
    fn test_browser_field_redirect() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let pkg = root.join("node_modules").join("dep");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{"main": "server.js", "browser": "client.js"}"#,
        )
        .unwrap();
        fs::write(pkg.join("server.js"), "").unwrap();
        fs::write(pkg.join("client.js"), "").unwrap();

        let exts = js_exts();
        let mut o = opts(&root, &exts);
        o.browser = true;
        assert_eq!(resolve("dep", &o).unwrap(), pkg.join("client.js"));

        o.browser = false;
        assert_eq!(resolve("dep", &o).unwrap(), pkg.join("server.js"));
    }

    #[test]
    fn test_ancestor_walk_finds_outer_package() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let pkg = root.join("node_modules").join("outer");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("index.js"), "").unwrap();

        let exts = js_exts();
        let resolved = resolve("outer", &opts(&nested, &exts)).unwrap();
        assert_eq!(resolved, pkg.join("index.js"));
    }

    #[test]
    fn test_scoped_package_subpath() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let pkg = root.join("node_modules").join("@scope").join("pkg");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("lib").join("util.js"), "").unwrap();

        let exts = js_exts();
        let resolved = resolve("@scope/pkg/lib/util", &opts(&root, &exts)).unwrap();
        assert_eq!(resolved, pkg.join("lib").join("util.js"));
    }

    #[test]
    fn test_extra_search_roots() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let extra = root.join("shared");
        fs::create_dir_all(extra.join("widget")).unwrap();
        fs::write(extra.join("widget").join("index.js"), "").unwrap();

        let from = root.join("proj");
        fs::create_dir(&from).unwrap();

        let exts = js_exts();
        let paths = vec![extra.clone()];
        let o = NodeResolutionOptions {
            basedir: &from,
            extensions: &exts,
            module_directories: &["node_modules".to_string()],
            paths: &paths,
            browser: false,
        };
        let resolved = resolve("widget", &o).unwrap();
        assert_eq!(resolved, extra.join("widget").join("index.js"));
    }

    #[test]
    fn test_missing_module_is_none() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let exts = js_exts();
        assert!(resolve("ghost", &opts(&root, &exts)).is_none());
        assert!(resolve("./ghost", &opts(&root, &exts)).is_none());
    }
}
