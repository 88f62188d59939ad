use crate::commands::app::CommandApp;
use crate::commands::function::Function;
use crate::script_file::LoadError;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

#[must_use]
pub fn inherit_path(parent: &Path, child: PathBuf) -> PathBuf {
    if child.as_os_str().is_empty() {
        parent.to_path_buf()
    } else if child.is_relative() {
        parent.join(child)
    } else {
        child
    }
}

/// Working directory and environment handed from an application to its children
#[derive(Default, Clone, Debug)]
pub struct Inheritance {
    /// Directory relative `cwd` entries resolve against
    base: PathBuf,
    /// Working directory commands run in, `None` keeps the caller's
    cwd: Option<PathBuf>,
    entry_path: Vec<String>,
    env: HashMap<String, String>,
}

impl Inheritance {
    fn canonicalize(&mut self) -> Result<(), io::Error> {
        if let Some(cwd) = &self.cwd {
            self.cwd = Some(cwd.canonicalize()?);
        }
        Ok(())
    }

    fn merge_entry_path(&self, entry: &str) -> Vec<String> {
        let mut new_entry_path = self.entry_path.clone();
        new_entry_path.push(entry.to_string());
        new_entry_path
    }

    fn child(&self, name: &str, cwd: Option<&PathBuf>, env: &HashMap<String, String>) -> Self {
        let parent_dir = self.cwd.as_ref().unwrap_or(&self.base);
        let cwd = cwd
            .map(|own| inherit_path(parent_dir, own.clone()))
            .or_else(|| self.cwd.clone());
        let mut merged_env = self.env.clone();
        merged_env.extend(env.clone());
        Inheritance {
            base: self.base.clone(),
            cwd,
            entry_path: self.merge_entry_path(name),
            env: merged_env,
        }
    }
}

impl From<PathBuf> for Inheritance {
    fn from(base: PathBuf) -> Self {
        Inheritance {
            base,
            ..Default::default()
        }
    }
}

/// Types that take working directory and environment from their parent
pub trait Inheritable: Sized {
    /// Calculate the inheritance state for this item.
    fn calculate_inheritance(&self, inheritance: &Inheritance) -> Inheritance;

    /// Apply previously calculated inheritance to this item.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if a child fails to inherit.
    fn apply_inheritance(&mut self, inheritance: &Inheritance) -> Result<(), LoadError>;

    /// Calculate and apply inheritance in one step.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::DirectoryNotFound` if a referenced directory does not exist.
    fn inherit(&mut self, inheritance: &Inheritance) -> Result<(), LoadError> {
        let mut inherited = self.calculate_inheritance(inheritance);
        inherited
            .canonicalize()
            .map_err(|e| LoadError::DirectoryNotFound {
                path: inherited.cwd.clone().unwrap_or_default(),
                entry: inherited.entry_path.join("."),
                source: e,
            })?;
        self.apply_inheritance(&inherited)
    }
}

impl Inheritable for Function {
    fn calculate_inheritance(&self, inheritance: &Inheritance) -> Inheritance {
        inheritance.child(&self.name, self.cwd.as_ref(), &self.env)
    }

    fn apply_inheritance(&mut self, inheritance: &Inheritance) -> Result<(), LoadError> {
        self.cwd.clone_from(&inheritance.cwd);
        self.env.clone_from(&inheritance.env);
        Ok(())
    }
}

impl Inheritable for CommandApp {
    fn calculate_inheritance(&self, inheritance: &Inheritance) -> Inheritance {
        let name = self.name.as_deref().unwrap_or("app");
        inheritance.child(name, self.cwd.as_ref(), &self.env)
    }

    fn apply_inheritance(&mut self, inheritance: &Inheritance) -> Result<(), LoadError> {
        self.cwd.clone_from(&inheritance.cwd);
        self.env.clone_from(&inheritance.env);
        for command in &mut self.commands {
            command.inherit(inheritance)?;
        }
        for group in &mut self.groups {
            group.inherit(inheritance)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn function(name: &str, cwd: Option<&str>) -> Function {
        Function {
            name: name.to_string(),
            exec: "true".to_string(),
            cwd: cwd.map(PathBuf::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_cwd_keeps_caller_directory() {
        let temp = TempDir::new().unwrap();
        let mut app = CommandApp {
            commands: vec![function("build", None)],
            ..Default::default()
        };
        app.inherit(&Inheritance::from(temp.path().to_path_buf()))
            .unwrap();
        assert_eq!(app.commands[0].cwd, None);
    }

    #[test]
    fn test_relative_cwd_resolves_against_parent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("web/src")).unwrap();

        let mut app = CommandApp {
            cwd: Some(PathBuf::from("web")),
            commands: vec![function("build", Some("src")), function("lint", None)],
            ..Default::default()
        };
        app.inherit(&Inheritance::from(root.clone())).unwrap();
        assert_eq!(app.commands[0].cwd, Some(root.join("web/src")));
        assert_eq!(app.commands[1].cwd, Some(root.join("web")));
    }

    #[test]
    fn test_env_merges_child_over_parent() {
        let temp = TempDir::new().unwrap();
        let mut command = function("build", None);
        command.env.insert("MODE".to_string(), "child".to_string());
        let mut app = CommandApp {
            env: HashMap::from([
                ("MODE".to_string(), "parent".to_string()),
                ("SHARED".to_string(), "yes".to_string()),
            ]),
            commands: vec![command],
            ..Default::default()
        };
        app.inherit(&Inheritance::from(temp.path().to_path_buf()))
            .unwrap();
        let env = &app.commands[0].env;
        assert_eq!(env.get("MODE").map(String::as_str), Some("child"));
        assert_eq!(env.get("SHARED").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_missing_directory_reports_entry_path() {
        let temp = TempDir::new().unwrap();
        let mut app = CommandApp {
            name: Some("tools".to_string()),
            commands: vec![function("build", Some("does-not-exist"))],
            ..Default::default()
        };
        let result = app.inherit(&Inheritance::from(temp.path().to_path_buf()));
        match result {
            Err(LoadError::DirectoryNotFound { entry, .. }) => assert_eq!(entry, "tools.build"),
            other => panic!("Expected DirectoryNotFound, got: {other:?}"),
        }
    }
}
