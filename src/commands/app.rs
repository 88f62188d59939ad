use std::collections::HashMap;
use std::path::PathBuf;

use crate::commands::function::Function;

/// A multi-command application: named commands plus nested sub-applications
#[derive(Debug, Clone, PartialEq)]
pub struct CommandApp {
    pub name: Option<String>,
    pub help: Option<String>,
    pub epilog: Option<String>,
    pub commands: Vec<Function>,
    pub groups: Vec<CommandApp>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    /// Adds `--show-completion` when converted; turned off for subcommands
    pub add_completion: bool,
}

impl Default for CommandApp {
    fn default() -> Self {
        CommandApp {
            name: None,
            help: None,
            epilog: None,
            commands: Vec::new(),
            groups: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            add_completion: true,
        }
    }
}

impl CommandApp {
    /// Promote a single callable into a one-command application
    #[must_use]
    pub fn from_function(function: Function) -> Self {
        CommandApp {
            commands: vec![function],
            ..Default::default()
        }
    }

    /// A lone command without groups converts into a plain command, not a group
    #[must_use]
    pub fn is_single_command(&self) -> bool {
        self.groups.is_empty() && self.commands.len() == 1
    }

    #[must_use]
    pub fn find_command(&self, name: &str) -> Option<&Function> {
        self.commands.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn find_group(&self, name: &str) -> Option<&CommandApp> {
        self.groups
            .iter()
            .find(|g| g.name.as_deref() == Some(name))
    }

    /// Returns a flattened list of all commands in this application and its groups
    #[must_use]
    pub fn all_commands(&self) -> Vec<&Function> {
        self.commands
            .iter()
            .chain(self.groups.iter().flat_map(|group| group.all_commands()))
            .collect()
    }
}
