use regex::Regex;
use std::path::PathBuf;

/// Default extensions for probing, in order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".json", ".node"];

/// Default directories searched during the ancestor walk.
pub const DEFAULT_MODULE_DIRECTORIES: &[&str] = &["node_modules"];

/// One `moduleNameMapper` rewrite rule.
///
/// Insertion order is significant: the first rule whose regex matches and
/// whose substitution resolves wins.
#[derive(Debug, Clone)]
pub struct NameMapperEntry {
    /// Pattern tested against the requested name.
    pub regex: Regex,
    /// Replacement template; capture groups are available as `$1`, `$2`, …
    pub replacement: String,
}

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Prefer `browser` fields in `package.json` during node resolution.
    pub browser: bool,

    /// Platform tried first in haste lookups.
    pub default_platform: Option<String>,

    /// File suffixes to probe, in order.
    pub extensions: Vec<String>,

    /// Whether host built-ins exist at all.
    pub has_core_modules: bool,

    /// Directory names crossed during the ancestor walk.
    pub module_directories: Vec<String>,

    /// Rewrite table applied by mock lookup.
    pub module_name_mapper: Vec<NameMapperEntry>,

    /// Extra absolute search roots, appended after `NODE_PATH`.
    pub module_paths: Vec<PathBuf>,

    /// Supported platforms; listing `"native"` enables native fallback.
    pub platforms: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            browser: false,
            default_platform: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            has_core_modules: true,
            module_directories: DEFAULT_MODULE_DIRECTORIES
                .iter()
                .map(ToString::to_string)
                .collect(),
            module_name_mapper: Vec::new(),
            module_paths: Vec::new(),
            platforms: Vec::new(),
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_browser(mut self, browser: bool) -> Self {
        self.browser = browser;
        self
    }

    #[must_use]
    pub fn with_default_platform(mut self, platform: impl Into<String>) -> Self {
        self.default_platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_core_modules(mut self, has_core_modules: bool) -> Self {
        self.has_core_modules = has_core_modules;
        self
    }

    #[must_use]
    pub fn with_module_directories(mut self, dirs: Vec<String>) -> Self {
        self.module_directories = dirs;
        self
    }

    #[must_use]
    pub fn with_name_mapper(mut self, entries: Vec<NameMapperEntry>) -> Self {
        self.module_name_mapper = entries;
        self
    }

    #[must_use]
    pub fn with_module_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.module_paths = paths;
        self
    }

    #[must_use]
    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Whether native-platform haste entries participate in lookups.
    #[must_use]
    pub fn supports_native_platform(&self) -> bool {
        self.platforms.iter().any(|p| p == crate::haste::NATIVE_PLATFORM)
    }
}
