//! Importing the requested command script into a fresh namespace

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::commands::namespace::Namespace;
use crate::script_file::{EXTENSIONS, LoadError, ScriptFile};
use crate::state::ResolutionState;

/// Environment variable listing extra directories searched for modules
pub const SEARCH_PATH_ENV: &str = "SCRIPTCLI_PATH";

/// Produces the namespace of the script selected by a `ResolutionState`
pub trait SourceLoader {
    /// Load the requested script, fully linked.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if no source is configured, the source cannot be
    /// found, or it fails to parse or link.
    fn load(&self, state: &ResolutionState) -> Result<Namespace, LoadError>;
}

/// Loads scripts from the filesystem, resolving modules through a search path
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    search_path: Vec<PathBuf>,
}

impl FsLoader {
    #[must_use]
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        FsLoader { search_path }
    }

    /// Current directory first, then the entries of `SCRIPTCLI_PATH`
    #[must_use]
    pub fn from_env() -> Self {
        let mut search_path: Vec<PathBuf> = std::env::current_dir().into_iter().collect();
        if let Some(extra) = std::env::var_os(SEARCH_PATH_ENV) {
            search_path.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
        }
        debug!("Module search path: {search_path:?}");
        FsLoader { search_path }
    }

    #[must_use]
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Map `tools.deploy` to the first existing `tools/deploy.{yaml,yml,json}`
    #[must_use]
    pub fn find_module(&self, module: &str) -> Option<PathBuf> {
        let relative: PathBuf = module.split('.').collect();
        self.search_path.iter().find_map(|dir| {
            EXTENSIONS.iter().find_map(|ext| {
                let mut candidate = dir.join(&relative);
                candidate.set_extension(ext);
                candidate.is_file().then_some(candidate)
            })
        })
    }
}

fn load_file(path: &Path, name: &str) -> Result<Namespace, LoadError> {
    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let script = ScriptFile::from_file(path)?;
    let namespace = script.into_namespace(name, &base)?;
    info!(
        "Loaded {} bindings from {}",
        namespace.len(),
        path.display()
    );
    Ok(namespace)
}

impl SourceLoader for FsLoader {
    fn load(&self, state: &ResolutionState) -> Result<Namespace, LoadError> {
        if let Some(path) = state.source_path() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("Importing script file {}", path.display());
            return load_file(path, &name);
        }
        if let Some(module) = state.source_module() {
            let path = self
                .find_module(module)
                .ok_or_else(|| LoadError::ModuleImport(module.to_string()))?;
            debug!("Importing module {module} from {}", path.display());
            return load_file(&path, module);
        }
        Err(LoadError::NoSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::namespace::Binding;

    #[test]
    fn test_load_path_keys_namespace_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.yaml");
        std::fs::write(&path, "greet:\n  exec: echo hi\n").unwrap();

        let mut state = ResolutionState::default();
        state.update(path.to_str(), None, None).unwrap();
        let namespace = FsLoader::default().load(&state).unwrap();
        assert_eq!(namespace.name, "hello.yaml");
        assert!(matches!(namespace.get("greet"), Some(Binding::Function(_))));
    }

    #[test]
    fn test_load_nested_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ops/deploy")).unwrap();
        std::fs::write(
            dir.path().join("ops/deploy/tasks.json"),
            r#"{"main": {"exec": "echo deploy"}}"#,
        )
        .unwrap();

        let loader = FsLoader::new(vec![dir.path().join("missing"), dir.path().to_path_buf()]);
        let mut state = ResolutionState::default();
        state.update(Some("ops.deploy.tasks"), None, None).unwrap();
        let namespace = loader.load(&state).unwrap();
        assert_eq!(namespace.name, "ops.deploy.tasks");
        assert!(namespace.get("main").is_some_and(Binding::is_callable));
    }

    #[test]
    fn test_yaml_preferred_over_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tools.json"), "{}").unwrap();
        std::fs::write(dir.path().join("tools.yaml"), "a: 1\n").unwrap();
        let loader = FsLoader::new(vec![dir.path().to_path_buf()]);
        assert_eq!(
            loader.find_module("tools"),
            Some(dir.path().join("tools.yaml"))
        );
    }

    #[test]
    fn test_missing_module_is_import_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(vec![dir.path().to_path_buf()]);
        let mut state = ResolutionState::default();
        state.update(Some("no_such.module"), None, None).unwrap();
        match loader.load(&state) {
            Err(LoadError::ModuleImport(module)) => assert_eq!(module, "no_such.module"),
            other => panic!("Expected ModuleImport, got: {other:?}"),
        }
    }

    #[test]
    fn test_no_source() {
        let result = FsLoader::default().load(&ResolutionState::default());
        assert!(matches!(result, Err(LoadError::NoSource)));
    }

    #[test]
    fn test_reload_sees_new_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.yaml");
        std::fs::write(&path, "greet:\n  exec: echo hi\n").unwrap();
        let mut state = ResolutionState::default();
        state.update(path.to_str(), None, None).unwrap();

        let loader = FsLoader::default();
        assert_eq!(loader.load(&state).unwrap().len(), 1);
        std::fs::write(&path, "greet:\n  exec: echo hi\nbye:\n  exec: echo bye\n").unwrap();
        assert_eq!(loader.load(&state).unwrap().len(), 2);
    }
}
