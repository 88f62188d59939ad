//! Which command script was requested, and how to pick an application from it

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use thiserror::Error;

static MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_]\w*(\.[a-zA-Z_]\w*)*$").expect("module name pattern is valid")
});

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Not a valid file or module: {0}")]
    InvalidSource(String),
}

/// Returns `true` if `name` is a dotted identifier such as `tools.deploy`.
#[must_use]
pub fn is_module_name(name: &str) -> bool {
    MODULE_NAME.is_match(name)
}

/// Source selection resolved from the top-level arguments.
///
/// Values are only ever set or overwritten, never cleared, so every later
/// operation in the same process sees what the first parse resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionState {
    source_path: Option<PathBuf>,
    source_module: Option<String>,
    app_name: Option<String>,
    func_name: Option<String>,
}

impl ResolutionState {
    /// Record the raw top-level arguments.
    ///
    /// An existing regular file wins over the module interpretation.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidSource` if `positional` is neither an
    /// existing file nor a dotted module name.
    pub fn update(
        &mut self,
        positional: Option<&str>,
        app: Option<&str>,
        func: Option<&str>,
    ) -> Result<(), ResolveError> {
        if let Some(value) = positional.filter(|v| !v.is_empty()) {
            let path = Path::new(value);
            if path.is_file() {
                debug!("Using script file {}", path.display());
                self.source_path = Some(path.to_path_buf());
            } else if is_module_name(value) {
                debug!("Using script module {value}");
                self.source_module = Some(value.to_string());
            } else {
                return Err(ResolveError::InvalidSource(value.to_string()));
            }
        }
        if let Some(app) = app.filter(|v| !v.is_empty()) {
            self.app_name = Some(app.to_string());
        }
        if let Some(func) = func.filter(|v| !v.is_empty()) {
            self.func_name = Some(func.to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    #[must_use]
    pub fn source_module(&self) -> Option<&str> {
        self.source_module.as_deref()
    }

    #[must_use]
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    #[must_use]
    pub fn func_name(&self) -> Option<&str> {
        self.func_name.as_deref()
    }

    /// Whether a script file or module has been requested.
    #[must_use]
    pub fn has_source(&self) -> bool {
        self.source_path.is_some() || self.source_module.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_file_sets_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool.yaml");
        std::fs::write(&file, "greet: {exec: echo hi}\n").unwrap();

        let mut state = ResolutionState::default();
        state.update(file.to_str(), None, None).unwrap();
        assert_eq!(state.source_path(), Some(file.as_path()));
        assert_eq!(state.source_module(), None);
        assert!(state.has_source());
    }

    #[test]
    fn test_dotted_name_sets_module() {
        let mut state = ResolutionState::default();
        state
            .update(Some("tools.deploy_v2.main"), None, None)
            .unwrap();
        assert_eq!(state.source_module(), Some("tools.deploy_v2.main"));
        assert_eq!(state.source_path(), None);
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ResolutionState::default();
        let result = state.update(dir.path().to_str(), None, None);
        match result {
            Err(ResolveError::InvalidSource(value)) => {
                assert_eq!(value, dir.path().to_str().unwrap());
            }
            other => panic!("Expected InvalidSource, got: {other:?}"),
        }
        assert!(!state.has_source());
    }

    #[test]
    fn test_invalid_module_names_rejected() {
        for value in ["1tools", "tools..deploy", "tools.", ".tools", "my-tool", "a b"] {
            let mut state = ResolutionState::default();
            assert!(
                state.update(Some(value), None, None).is_err(),
                "{value} should be rejected"
            );
            assert!(!state.has_source());
        }
    }

    #[test]
    fn test_overrides_overwrite_previous_values() {
        let mut state = ResolutionState::default();
        state.update(None, Some("first"), Some("one")).unwrap();
        state.update(None, Some("second"), None).unwrap();
        assert_eq!(state.app_name(), Some("second"));
        assert_eq!(state.func_name(), Some("one"));
    }

    #[test]
    fn test_absent_values_never_clear() {
        let mut state = ResolutionState::default();
        state.update(Some("tools"), Some("app"), None).unwrap();
        state.update(None, None, None).unwrap();
        assert_eq!(state.source_module(), Some("tools"));
        assert_eq!(state.app_name(), Some("app"));
    }
}
