//! The layered resolver.
//!
//! Lookup order for `resolve_module`: haste map, then node resolution,
//! then haste packages. Positive results are memoized per
//! `(caller directory, requested name)`; negative results are not, since
//! a later filesystem change could make them succeed.

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::haste::{HasteMap, HasteModuleType, GENERIC_PLATFORM, NATIVE_PLATFORM};
use crate::node_resolution::{self, NodeResolutionOptions};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Host built-ins. `node:`-prefixed requests map onto the same names.
const CORE_MODULES: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "https",
    "module",
    "net",
    "os",
    "path",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "zlib",
];

/// Per-call options for `resolve_module`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveModuleOptions {
    /// Skip the node algorithm entirely (haste-only resolution).
    pub skip_node_resolution: bool,
}

/// The layered resolver. Stateless with respect to evaluation; owns two
/// memoization tables.
#[derive(Debug)]
pub struct Resolver {
    haste_map: Arc<HasteMap>,
    config: ResolverConfig,
    /// `NODE_PATH` entries followed by configured module paths.
    search_paths: Vec<PathBuf>,
    /// `(caller directory, name)` → resolved path.
    module_name_cache: RwLock<FxHashMap<String, PathBuf>>,
    /// caller directory → upward `node_modules` walk.
    module_paths_cache: RwLock<FxHashMap<PathBuf, Vec<PathBuf>>>,
}

impl Resolver {
    /// Build a resolver over a shared haste index.
    ///
    /// `NODE_PATH` is read once here; later environment changes are not
    /// observed by this instance.
    #[must_use]
    pub fn new(haste_map: Arc<HasteMap>, config: ResolverConfig) -> Self {
        let mut search_paths: Vec<PathBuf> = std::env::var_os("NODE_PATH")
            .map(|raw| std::env::split_paths(&raw).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        search_paths.extend(config.module_paths.iter().cloned());

        Self {
            haste_map,
            config,
            search_paths,
            module_name_cache: RwLock::new(FxHashMap::default()),
            module_paths_cache: RwLock::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `name` as required from the file `from`.
    pub fn resolve_module(
        &self,
        from: &Path,
        name: &str,
        options: ResolveModuleOptions,
    ) -> Result<PathBuf, ResolveError> {
        let dirname = from.parent().unwrap_or_else(|| Path::new("."));
        let cache_key = format!("{}\u{0}{}", dirname.display(), name);

        if let Some(hit) = self.module_name_cache.read().unwrap().get(&cache_key) {
            return Ok(hit.clone());
        }

        // 1. Haste lookup
        if let Some(path) = self.get_module(name) {
            return Ok(self.remember(cache_key, path));
        }

        // 2. Node resolution
        if !options.skip_node_resolution {
            if let Some(path) = node_resolution::resolve(name, &self.node_options(dirname)) {
                return Ok(self.remember(cache_key, path));
            }
        }

        // 3. Haste package: first segment names the package, the rest is
        // resolved relative to the package entry's directory.
        let mut segments = name.splitn(2, '/');
        let head = segments.next().unwrap_or(name);
        if let Some(pkg_path) = self.get_package(head) {
            let pkg_dir = pkg_path.parent().unwrap_or_else(|| Path::new("."));
            let target = match segments.next() {
                Some(rest) => pkg_dir.join(rest),
                None => pkg_dir.to_path_buf(),
            };
            if let Some(path) =
                node_resolution::resolve_file_or_directory(&target, &self.node_options(dirname))
            {
                return Ok(self.remember(cache_key, path));
            }
        }

        tracing::debug!(name, from = %from.display(), "module not found");
        Err(ResolveError::ModuleNotFound {
            request: name.to_string(),
            relative_from: relative_to_dir(dirname, from),
        })
    }

    /// Whether `name` is a host-provided built-in.
    #[must_use]
    pub fn is_core_module(&self, name: &str) -> bool {
        if !self.config.has_core_modules {
            return false;
        }
        let name = name.strip_prefix("node:").unwrap_or(name);
        CORE_MODULES.contains(&name)
    }

    /// Haste lookup of `name` as a module.
    #[must_use]
    pub fn get_module(&self, name: &str) -> Option<PathBuf> {
        self.haste_entry(name, HasteModuleType::Module)
    }

    /// Haste lookup of `name` as a package.
    #[must_use]
    pub fn get_package(&self, name: &str) -> Option<PathBuf> {
        self.haste_entry(name, HasteModuleType::Package)
    }

    /// Pick the haste entry for `name` by platform preference, then
    /// require its type to match.
    fn haste_entry(&self, name: &str, module_type: HasteModuleType) -> Option<PathBuf> {
        let preferred = self
            .config
            .default_platform
            .as_deref()
            .and_then(|platform| self.haste_map.get(name, platform));

        let native = if self.config.supports_native_platform() {
            self.haste_map.get(name, NATIVE_PLATFORM)
        } else {
            None
        };

        let entry = preferred
            .or(native)
            .or_else(|| self.haste_map.get(name, GENERIC_PLATFORM))?;

        (entry.module_type == module_type).then(|| entry.path.clone())
    }

    /// Locate a manual mock for `name`: the haste mock table first, then
    /// the name-mapper rewrite table.
    #[must_use]
    pub fn get_mock_module(&self, from: &Path, name: &str) -> Option<PathBuf> {
        if let Some(path) = self.haste_map.get_mock(name) {
            return Some(path.to_path_buf());
        }

        let dirname = from.parent().unwrap_or_else(|| Path::new("."));
        for entry in &self.config.module_name_mapper {
            if !entry.regex.is_match(name) {
                continue;
            }
            let mapped = entry
                .regex
                .replace(name, entry.replacement.as_str())
                .into_owned();
            if let Some(path) = self.get_module(&mapped) {
                return Some(path);
            }
            if let Some(path) = node_resolution::resolve(&mapped, &self.node_options(dirname)) {
                return Some(path);
            }
        }

        None
    }

    /// Memoized upward `node_modules` walk from `from`.
    #[must_use]
    pub fn get_module_paths(&self, from: &Path) -> Vec<PathBuf> {
        if let Some(hit) = self.module_paths_cache.read().unwrap().get(from) {
            return hit.clone();
        }

        let mut paths = Vec::new();
        let mut current = Some(from);
        while let Some(dir) = current {
            let is_module_dir = dir
                .file_name()
                .is_some_and(|n| self.config.module_directories.iter().any(|d| *n == **d));
            if !is_module_dir && !dir.as_os_str().is_empty() {
                paths.push(dir.join("node_modules"));
            }
            current = dir.parent();
        }
        // An empty trailing entry would make downstream joins silently
        // relative; keep the list free of them.
        paths.retain(|p| !p.as_os_str().is_empty());

        self.module_paths_cache
            .write()
            .unwrap()
            .insert(from.to_path_buf(), paths.clone());
        paths
    }

    fn remember(&self, cache_key: String, path: PathBuf) -> PathBuf {
        self.module_name_cache
            .write()
            .unwrap()
            .insert(cache_key, path.clone());
        path
    }

    fn node_options<'a>(&'a self, basedir: &'a Path) -> NodeResolutionOptions<'a> {
        NodeResolutionOptions {
            basedir,
            extensions: &self.config.extensions,
            module_directories: &self.config.module_directories,
            paths: &self.search_paths,
            browser: self.config.browser,
        }
    }
}

/// The caller's path relative to its own directory (`.` when the two
/// coincide). Used only for error messages.
fn relative_to_dir(dirname: &Path, from: &Path) -> String {
    match from.strip_prefix(dirname) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => ".".to_string(),
    }
}
