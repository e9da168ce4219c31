//! The haste index consumed by the resolver.
//!
//! A flat namespace layered above node resolution: modules are keyed by a
//! declared short name regardless of their location on disk, with one
//! entry per platform. The index also carries a manual-mock table
//! (`name → path`). The resolver treats the whole structure as read-only.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Platform key for entries with no platform suffix.
pub const GENERIC_PLATFORM: &str = "g";

/// Platform key for native-suffixed entries.
pub const NATIVE_PLATFORM: &str = "native";

/// Kind of a haste entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasteModuleType {
    Module,
    Package,
}

/// A single indexed file.
#[derive(Debug, Clone)]
pub struct HasteEntry {
    pub module_type: HasteModuleType,
    pub path: PathBuf,
}

/// The pre-built index: `name → platform → entry`, plus the mock table.
#[derive(Debug, Clone, Default)]
pub struct HasteMap {
    map: FxHashMap<String, FxHashMap<String, HasteEntry>>,
    mocks: FxHashMap<String, PathBuf>,
}

impl HasteMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under `name` for `platform`.
    pub fn add_module(
        &mut self,
        name: impl Into<String>,
        platform: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> &mut Self {
        self.add_entry(name, platform, HasteModuleType::Module, path)
    }

    /// Register a package (its `package.json`) under `name` for `platform`.
    pub fn add_package(
        &mut self,
        name: impl Into<String>,
        platform: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> &mut Self {
        self.add_entry(name, platform, HasteModuleType::Package, path)
    }

    fn add_entry(
        &mut self,
        name: impl Into<String>,
        platform: impl Into<String>,
        module_type: HasteModuleType,
        path: impl Into<PathBuf>,
    ) -> &mut Self {
        self.map.entry(name.into()).or_default().insert(
            platform.into(),
            HasteEntry {
                module_type,
                path: path.into(),
            },
        );
        self
    }

    /// Register a manual mock for `name`.
    pub fn add_mock(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        self.mocks.insert(name.into(), path.into());
        self
    }

    /// Look up the entry for `name` on `platform`.
    #[must_use]
    pub fn get(&self, name: &str, platform: &str) -> Option<&HasteEntry> {
        self.map.get(name)?.get(platform)
    }

    /// Look up the manual mock registered for `name`.
    #[must_use]
    pub fn get_mock(&self, name: &str) -> Option<&Path> {
        self.mocks.get(name).map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_entries_are_independent() {
        let mut map = HasteMap::new();
        map.add_module("foo", GENERIC_PLATFORM, "/h/foo.js");
        map.add_module("foo", "ios", "/h/foo.ios.js");

        assert_eq!(
            map.get("foo", GENERIC_PLATFORM).unwrap().path,
            PathBuf::from("/h/foo.js")
        );
        assert_eq!(
            map.get("foo", "ios").unwrap().path,
            PathBuf::from("/h/foo.ios.js")
        );
        assert!(map.get("foo", NATIVE_PLATFORM).is_none());
    }

    #[test]
    fn test_mock_table() {
        let mut map = HasteMap::new();
        map.add_mock("foo", "/h/__mocks__/foo.js");

        assert_eq!(
            map.get_mock("foo"),
            Some(Path::new("/h/__mocks__/foo.js"))
        );
        assert!(map.get_mock("bar").is_none());
    }
}
