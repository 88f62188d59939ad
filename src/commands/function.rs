use std::collections::HashMap;
use std::path::PathBuf;

/// Whether a parameter is positional or a named flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamKind {
    #[default]
    Argument,
    Option,
}

/// Value type of a parameter, used for validation and help metavars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Path,
}

impl ParamType {
    #[must_use]
    pub fn metavar(self) -> &'static str {
        match self {
            ParamType::Str => "TEXT",
            ParamType::Int => "INTEGER",
            ParamType::Float => "FLOAT",
            ParamType::Bool => "BOOLEAN",
            ParamType::Path => "PATH",
        }
    }
}

/// A single declared parameter of a script function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    pub name: String,
    pub help: Option<String>,
    pub kind: ParamKind,
    pub ty: ParamType,
    pub default: Option<String>,
    pub required: bool,
    pub short: Option<char>,
    pub choices: Vec<String>,
}

impl Param {
    /// Long flag for options, `dry_run` becomes `dry-run`
    #[must_use]
    pub fn flag_name(&self) -> String {
        command_name(&self.name)
    }

    /// Positional metavar, `dry_run` becomes `DRY_RUN`
    #[must_use]
    pub fn value_name(&self) -> String {
        match self.kind {
            ParamKind::Argument => self.name.to_uppercase(),
            ParamKind::Option if !self.choices.is_empty() => format!("[{}]", self.choices.join("|")),
            ParamKind::Option => self.ty.metavar().to_string(),
        }
    }

    #[must_use]
    pub fn is_flag(&self) -> bool {
        self.kind == ParamKind::Option && self.ty == ParamType::Bool
    }
}

/// A callable script binding: a shell snippet with declared parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Function {
    pub name: String,
    pub help: Option<String>,
    pub epilog: Option<String>,
    pub params: Vec<Param>,
    pub exec: String,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

/// Turn a binding name into a command name: `deploy_all` becomes `deploy-all`
#[must_use]
pub fn command_name(binding: &str) -> String {
    binding.to_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("Deploy_All"), "deploy-all");
        assert_eq!(command_name("greet"), "greet");
    }

    #[test]
    fn test_value_names() {
        let arg = Param {
            name: "user_name".to_string(),
            ..Default::default()
        };
        assert_eq!(arg.value_name(), "USER_NAME");

        let opt = Param {
            name: "count".to_string(),
            kind: ParamKind::Option,
            ty: ParamType::Int,
            ..Default::default()
        };
        assert_eq!(opt.value_name(), "INTEGER");
        assert_eq!(opt.flag_name(), "count");

        let choice = Param {
            name: "color".to_string(),
            kind: ParamKind::Option,
            choices: vec!["red".to_string(), "blue".to_string()],
            ..Default::default()
        };
        assert_eq!(choice.value_name(), "[red|blue]");
    }
}
