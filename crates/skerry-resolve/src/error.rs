use thiserror::Error;

/// Resolution failure.
///
/// The message format is a stable contract: test code catches these and
/// matches on the text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Cannot find module '{request}' from '{relative_from}'")]
    ModuleNotFound {
        /// The specifier as the caller wrote it.
        request: String,
        /// The caller's path relative to its own directory (`.` if empty).
        relative_from: String,
    },
}

impl ResolveError {
    /// Stable error code, mirroring the host runtime's convention.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModuleNotFound { .. } => "MODULE_NOT_FOUND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_not_found_message() {
        let err = ResolveError::ModuleNotFound {
            request: "nope".to_string(),
            relative_from: "x.js".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot find module 'nope' from 'x.js'");
        assert_eq!(err.code(), "MODULE_NOT_FOUND");
    }
}
