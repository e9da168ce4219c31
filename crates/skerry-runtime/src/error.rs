use crate::transform::TransformError;
use skerry_resolve::ResolveError;
use std::path::PathBuf;
use thiserror::Error;

/// Runtime error type.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A transform-reported syntax error, rewrapped with the offending
    /// file relative to the project root and the preprocessor hint.
    #[error("Syntax error in {}: {message}{}", .path.display(), preprocessor_hint(.preprocessor))]
    ModuleParse {
        path: PathBuf,
        message: String,
        preprocessor: Option<String>,
    },

    /// Any non-syntax transformer failure, propagated unchanged.
    #[error(transparent)]
    Transform(TransformError),

    #[error("Failed to read module at {}: {source}", .path.display())]
    ModuleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON module at {}: {source}", .path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to get mock metadata for {}", .path.display())]
    MockMetadata { path: PathBuf },

    #[error("Native addons are not supported by this environment: {}", .path.display())]
    NativeAddon { path: PathBuf },

    #[error("Invalid unmocked-module path pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A per-module require outlived its runtime.
    #[error("module runtime was dropped")]
    Detached,
}

impl RuntimeError {
    /// Stable error code carried by resolution failures.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Resolve(err) => Some(err.code()),
            _ => None,
        }
    }
}

fn preprocessor_hint(preprocessor: &Option<String>) -> String {
    match preprocessor {
        Some(p) => format!(" (processed with {p})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_code_is_forwarded() {
        let err = RuntimeError::Resolve(ResolveError::ModuleNotFound {
            request: "nope".to_string(),
            relative_from: ".".to_string(),
        });
        assert_eq!(err.code(), Some("MODULE_NOT_FOUND"));
        assert_eq!(err.to_string(), "Cannot find module 'nope' from '.'");
    }

    #[test]
    fn test_module_parse_mentions_preprocessor() {
        let err = RuntimeError::ModuleParse {
            path: PathBuf::from("src/broken.js"),
            message: "unexpected token".to_string(),
            preprocessor: Some("ts-compiler".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("src/broken.js"));
        assert!(text.contains("ts-compiler"));

        let err = RuntimeError::ModuleParse {
            path: PathBuf::from("src/broken.js"),
            message: "unexpected token".to_string(),
            preprocessor: None,
        };
        assert!(!err.to_string().contains("processed with"));
    }
}
