use std::collections::BTreeMap;

use crate::commands::app::CommandApp;
use crate::commands::function::Function;

/// A top-level value of a loaded script, classified by capability
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    App(CommandApp),
    Function(Function),
    Other(serde_yaml::Value),
}

impl Binding {
    #[must_use]
    pub fn is_app(&self) -> bool {
        matches!(self, Binding::App(_))
    }

    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Binding::Function(_))
    }
}

/// Name to binding map produced by loading one script.
///
/// Names enumerate in sorted order, which keeps discovery deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    pub name: String,
    bindings: BTreeMap<String, Binding>,
}

impl Namespace {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Namespace {
            name: name.into(),
            bindings: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Binding> {
        self.bindings.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
