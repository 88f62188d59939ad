//! Command script parsing and linking
//!
//! A command script is a YAML or JSON mapping of binding names to values. Mappings with an
//! `exec` key are callable functions, mappings with `commands` or `groups` are applications,
//! and everything else is kept as an opaque value.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::commands::app::CommandApp;
use crate::commands::convert::{HELP, SHOW_COMPLETION};
use crate::commands::function::{Function, Param, ParamKind, ParamType, command_name};
use crate::commands::inherit::{Inheritable, Inheritance};
use crate::commands::namespace::{Binding, Namespace};
use crate::state::is_module_name;

/// Errors that can occur while importing a command script
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No script file or module was given")]
    NoSource,
    #[error("Could not import as script file: {path}")]
    FileImport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not import as module: {0}")]
    ModuleImport(String),
    #[error("Unable to find directory: {path:?} (entry: {entry:?})")]
    DirectoryNotFound {
        entry: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse YAML script {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON script {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Invalid binding `{name}` in {path}: {source}")]
    Binding {
        name: String,
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid script {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Parameter names the generated commands use themselves
const RESERVED_PARAMS: [&str; 2] = [HELP, SHOW_COMPLETION];

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigParamType {
    #[serde(alias = "string")]
    Str,
    #[serde(alias = "integer")]
    Int,
    Float,
    #[serde(alias = "boolean")]
    Bool,
    Path,
}

impl From<ConfigParamType> for ParamType {
    fn from(config: ConfigParamType) -> Self {
        match config {
            ConfigParamType::Str => ParamType::Str,
            ConfigParamType::Int => ParamType::Int,
            ConfigParamType::Float => ParamType::Float,
            ConfigParamType::Bool => ParamType::Bool,
            ConfigParamType::Path => ParamType::Path,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigParamKind {
    Argument,
    Option,
}

/// Configuration for a single function parameter
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigParam {
    pub name: String,
    pub help: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<ConfigParamType>,
    pub kind: Option<ConfigParamKind>,
    pub default: Option<Value>,
    pub required: Option<bool>,
    pub short: Option<char>,
    pub choices: Option<Vec<String>>,
}

/// Configuration for a callable binding
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigFunction {
    pub name: Option<String>,
    pub help: Option<String>,
    pub epilog: Option<String>,
    pub params: Option<Vec<ConfigParam>>,
    pub exec: String,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
}

/// An application's command: a function binding name or an inline function
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ConfigCommandEntry {
    Ref(String),
    Inline(ConfigFunction),
}

/// An application's group: an application binding name or an inline application
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ConfigGroupEntry {
    Ref(String),
    Inline(Box<ConfigApp>),
}

/// Configuration for an application binding
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigApp {
    pub name: Option<String>,
    pub help: Option<String>,
    pub epilog: Option<String>,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
    pub commands: Option<Vec<ConfigCommandEntry>>,
    pub groups: Option<Vec<ConfigGroupEntry>>,
}

/// A top-level value as written in the script, before linking
#[derive(Debug, Clone)]
pub enum ConfigBinding {
    App(ConfigApp),
    Function(ConfigFunction),
    Other(Value),
}

/// A parsed, not yet linked, command script
#[derive(Debug)]
pub struct ScriptFile {
    pub path: PathBuf,
    pub bindings: BTreeMap<String, ConfigBinding>,
}

/// File extensions tried when resolving a module name, in order
pub const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

fn classify(name: &str, value: Value, path: &Path) -> Result<ConfigBinding, LoadError> {
    let binding_error = |source| LoadError::Binding {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    };
    let (callable, app) = match &value {
        Value::Mapping(map) => (
            map.contains_key("exec"),
            map.contains_key("commands") || map.contains_key("groups"),
        ),
        _ => (false, false),
    };
    if callable {
        serde_yaml::from_value(value)
            .map(ConfigBinding::Function)
            .map_err(binding_error)
    } else if app {
        serde_yaml::from_value(value)
            .map(ConfigBinding::App)
            .map_err(binding_error)
    } else {
        Ok(ConfigBinding::Other(value))
    }
}

impl ScriptFile {
    /// Reads and parses a command script.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::FileImport` if the file cannot be read, or
    /// `LoadError::Yaml`/`LoadError::Json`/`LoadError::Binding` if parsing fails.
    pub fn from_file(file: &Path) -> Result<ScriptFile, LoadError> {
        let contents = std::fs::read_to_string(file).map_err(|e| LoadError::FileImport {
            path: file.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, file)
    }

    /// Parses script contents, choosing JSON or YAML from the file extension.
    ///
    /// # Errors
    ///
    /// Returns a parse error, or `LoadError::Invalid` if the top level is not a mapping.
    pub fn parse(contents: &str, path: &Path) -> Result<ScriptFile, LoadError> {
        let document: Value = if contents.trim().is_empty() {
            Value::Null
        } else if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(contents).map_err(|e| LoadError::Json {
                source: e,
                path: path.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(contents).map_err(|e| LoadError::Yaml {
                source: e,
                path: path.to_path_buf(),
            })?
        };

        let mut bindings = BTreeMap::new();
        match document {
            Value::Null => {}
            Value::Mapping(map) => {
                for (key, value) in map {
                    let Some(name) = key.as_str() else {
                        warn!("Skipping non-string key {key:?} in {}", path.display());
                        continue;
                    };
                    bindings.insert(name.to_string(), classify(name, value, path)?);
                }
            }
            _ => {
                return Err(LoadError::Invalid {
                    path: path.to_path_buf(),
                    message: "top level must be a mapping of names to values".to_string(),
                });
            }
        }
        debug!("Parsed {} bindings from {}", bindings.len(), path.display());
        Ok(ScriptFile {
            path: path.to_path_buf(),
            bindings,
        })
    }

    /// Link every binding and resolve working directories against `base`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Invalid` for unresolved references, cycles and bad
    /// parameters, or `LoadError::DirectoryNotFound` for a missing `cwd`.
    pub fn into_namespace(self, name: &str, base: &Path) -> Result<Namespace, LoadError> {
        let mut namespace = Namespace::new(name);
        let inheritance = Inheritance::from(base.to_path_buf());
        let mut linker = Linker {
            path: &self.path,
            bindings: &self.bindings,
            stack: Vec::new(),
        };
        for (key, binding) in &self.bindings {
            let linked = match binding {
                ConfigBinding::App(config) => {
                    linker.stack = vec![key.as_str()];
                    let mut app = linker.app(None, config)?;
                    app.inherit(&inheritance)?;
                    Binding::App(app)
                }
                ConfigBinding::Function(config) => {
                    let mut function = linker.function(key, config)?;
                    function.inherit(&inheritance)?;
                    Binding::Function(function)
                }
                ConfigBinding::Other(value) => Binding::Other(value.clone()),
            };
            namespace.insert(key.clone(), linked);
        }
        Ok(namespace)
    }
}

fn is_identifier(name: &str) -> bool {
    !name.contains('.') && is_module_name(name)
}

/// Two options that clap would give the same `--long` or `-s`
fn clashes(a: &Param, b: &Param) -> bool {
    if a.kind != ParamKind::Option || b.kind != ParamKind::Option {
        return false;
    }
    a.flag_name() == b.flag_name() || (a.short.is_some() && a.short == b.short)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolves references between bindings while linking one script
struct Linker<'a> {
    path: &'a Path,
    bindings: &'a BTreeMap<String, ConfigBinding>,
    /// Application bindings currently being linked, for cycle detection
    stack: Vec<&'a str>,
}

impl<'a> Linker<'a> {
    fn invalid(&self, message: String) -> LoadError {
        LoadError::Invalid {
            path: self.path.to_path_buf(),
            message,
        }
    }

    fn function(&self, binding: &str, config: &ConfigFunction) -> Result<Function, LoadError> {
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| command_name(binding));
        if name.trim().is_empty() {
            return Err(self.invalid(format!("Function `{binding}` has an empty name")));
        }
        if config.exec.trim().is_empty() {
            return Err(self.invalid(format!("Function `{name}` has an empty exec string")));
        }
        let mut params: Vec<Param> = Vec::new();
        for param in config.params.iter().flatten() {
            let param = self.param(&name, param)?;
            if params.iter().any(|p| p.name == param.name) {
                return Err(self.invalid(format!(
                    "Function `{name}` declares parameter `{}` twice",
                    param.name
                )));
            }
            if let Some(other) = params.iter().find(|p| clashes(p, &param)) {
                return Err(self.invalid(format!(
                    "Parameters `{}` and `{}` of `{name}` use the same flag",
                    other.name, param.name
                )));
            }
            if param.kind == ParamKind::Argument
                && param.default.is_none()
                && params
                    .iter()
                    .any(|p| p.kind == ParamKind::Argument && p.default.is_some())
            {
                return Err(self.invalid(format!(
                    "Required argument `{}` of `{name}` follows an optional one",
                    param.name
                )));
            }
            params.push(param);
        }
        Ok(Function {
            name,
            help: config.help.clone(),
            epilog: config.epilog.clone(),
            params,
            exec: config.exec.clone(),
            cwd: config.cwd.clone(),
            env: config.env.clone().unwrap_or_default(),
        })
    }

    fn param(&self, function: &str, config: &ConfigParam) -> Result<Param, LoadError> {
        if !is_identifier(&config.name) {
            return Err(self.invalid(format!(
                "Parameter `{}` of `{function}` is not an identifier",
                config.name
            )));
        }
        let flag = command_name(&config.name);
        if RESERVED_PARAMS.iter().any(|reserved| command_name(reserved) == flag) {
            return Err(self.invalid(format!(
                "Parameter `{}` of `{function}` uses a reserved name",
                config.name
            )));
        }
        let ty = config.ty.map_or(ParamType::Str, ParamType::from);
        let default = match &config.default {
            Some(value) => Some(scalar_to_string(value).ok_or_else(|| {
                self.invalid(format!(
                    "Default of parameter `{}` of `{function}` must be a scalar",
                    config.name
                ))
            })?),
            None => None,
        };
        let kind = match config.kind {
            Some(ConfigParamKind::Argument) => ParamKind::Argument,
            Some(ConfigParamKind::Option) => ParamKind::Option,
            None if default.is_some() || ty == ParamType::Bool => ParamKind::Option,
            None => ParamKind::Argument,
        };
        Ok(Param {
            name: config.name.clone(),
            help: config.help.clone(),
            kind,
            ty,
            default,
            required: config.required.unwrap_or(false),
            short: config.short,
            choices: config.choices.clone().unwrap_or_default(),
        })
    }

    fn app(&mut self, binding: Option<&str>, config: &'a ConfigApp) -> Result<CommandApp, LoadError> {
        let name = config.name.clone().or_else(|| binding.map(command_name));
        let label = name.clone().unwrap_or_else(|| "application".to_string());

        let mut commands: Vec<Function> = Vec::new();
        for entry in config.commands.iter().flatten() {
            let function = match entry {
                ConfigCommandEntry::Ref(reference) => match self.bindings.get(reference) {
                    Some(ConfigBinding::Function(function)) => self.function(reference, function)?,
                    _ => {
                        return Err(self.invalid(format!(
                            "Command `{reference}` of `{label}` does not name a function"
                        )));
                    }
                },
                ConfigCommandEntry::Inline(function) => {
                    if function.name.is_none() {
                        return Err(
                            self.invalid(format!("Inline command of `{label}` has no name"))
                        );
                    }
                    self.function("", function)?
                }
            };
            if commands.iter().any(|c| c.name == function.name) {
                return Err(self.invalid(format!(
                    "Command `{}` appears twice in `{label}`",
                    function.name
                )));
            }
            commands.push(function);
        }

        let mut groups: Vec<CommandApp> = Vec::new();
        for entry in config.groups.iter().flatten() {
            let group = match entry {
                ConfigGroupEntry::Ref(reference) => match self.bindings.get_key_value(reference) {
                    Some((key, ConfigBinding::App(app))) => {
                        if self.stack.contains(&key.as_str()) {
                            return Err(self.invalid(format!(
                                "Circular group reference involving `{key}`"
                            )));
                        }
                        self.stack.push(key);
                        let group = self.app(Some(key), app);
                        self.stack.pop();
                        group?
                    }
                    _ => {
                        return Err(self.invalid(format!(
                            "Group `{reference}` of `{label}` does not name an application"
                        )));
                    }
                },
                ConfigGroupEntry::Inline(app) => {
                    if app.name.is_none() {
                        return Err(self.invalid(format!("Inline group of `{label}` has no name")));
                    }
                    self.app(None, app)?
                }
            };
            let group_name = group.name.as_deref().unwrap_or_default();
            if commands.iter().any(|c| c.name == group_name)
                || groups.iter().any(|g| g.name == group.name)
            {
                return Err(self.invalid(format!(
                    "Command `{group_name}` appears twice in `{label}`"
                )));
            }
            groups.push(group);
        }

        if commands.is_empty() && groups.is_empty() {
            return Err(self.invalid(format!("Application `{label}` has no commands")));
        }

        Ok(CommandApp {
            name,
            help: config.help.clone(),
            epilog: config.epilog.clone(),
            commands,
            groups,
            cwd: config.cwd.clone(),
            env: config.env.clone().unwrap_or_default(),
            add_completion: true,
        })
    }
}
