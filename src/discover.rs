//! Picking the command application out of a loaded namespace

use log::debug;
use thiserror::Error;

use crate::commands::app::CommandApp;
use crate::commands::namespace::{Binding, Namespace};

/// Application binding names checked before any other name
pub const DEFAULT_APP_NAMES: [&str; 3] = ["app", "cli", "main"];
/// Function binding names checked before any other name
pub const DEFAULT_FUNC_NAMES: [&str; 3] = ["main", "cli", "app"];

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Not an application object: --app {0}")]
    NotAnApp(String),
    #[error("Not a function: --func {0}")]
    NotCallable(String),
}

/// Preferred names in order, then the remaining names in namespace order
fn find_name(
    namespace: &Namespace,
    preferred: &[&str],
    accept: impl Fn(&Binding) -> bool,
) -> Option<String> {
    preferred
        .iter()
        .copied()
        .find(|name| namespace.get(name).is_some_and(&accept))
        .or_else(|| {
            namespace
                .iter()
                .find(|&(name, binding)| !preferred.contains(&name) && accept(binding))
                .map(|(name, _)| name)
        })
        .map(ToString::to_string)
}

/// Find or synthesize the application to expose, consuming the namespace.
///
/// An explicit `app_name` or `func_name` must name a binding of the right
/// kind. Without overrides, applications win over functions and the
/// conventional names win over everything else.
///
/// # Errors
///
/// Returns `DiscoverError::NotAnApp` or `DiscoverError::NotCallable` when an
/// override names the wrong kind of binding.
pub fn discover(
    mut namespace: Namespace,
    app_name: Option<&str>,
    func_name: Option<&str>,
) -> Result<Option<CommandApp>, DiscoverError> {
    if let Some(name) = app_name {
        return match namespace.remove(name) {
            Some(Binding::App(app)) => Ok(Some(app)),
            _ => Err(DiscoverError::NotAnApp(name.to_string())),
        };
    }
    if let Some(name) = func_name {
        return match namespace.remove(name) {
            Some(Binding::Function(function)) => Ok(Some(CommandApp::from_function(function))),
            _ => Err(DiscoverError::NotCallable(name.to_string())),
        };
    }

    if let Some(name) = find_name(&namespace, &DEFAULT_APP_NAMES, Binding::is_app)
        && let Some(Binding::App(app)) = namespace.remove(&name)
    {
        debug!("Using application `{name}` from {}", namespace.name);
        return Ok(Some(app));
    }
    if let Some(name) = find_name(&namespace, &DEFAULT_FUNC_NAMES, Binding::is_callable)
        && let Some(Binding::Function(function)) = namespace.remove(&name)
    {
        debug!("Using function `{name}` from {}", namespace.name);
        return Ok(Some(CommandApp::from_function(function)));
    }
    debug!("No application or function found in {}", namespace.name);
    Ok(None)
}
