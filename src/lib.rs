//! Core implementation of scriptcli
//!
//! scriptcli turns a YAML or JSON command script into a command line
//! application without packaging it. The script is picked by a path or a
//! dotted module name on the command line, loaded only when a command needs
//! it, and the application found in it is exposed as the `run` subcommand,
//! with help, bash completion and generated Markdown docs.

use log::debug;

use crate::commands::app::CommandApp;
use crate::host::HostError;
use crate::loader::SourceLoader;
use crate::state::ResolutionState;

pub mod cli;
pub mod commands;
pub mod completion;
pub mod discover;
pub mod docs;
pub mod exec;
pub mod host;
pub mod loader;
pub mod logger;
pub mod script_file;
pub mod state;

/// Load the script selected by `state` and discover its application.
///
/// # Errors
///
/// Returns `HostError` if the script cannot be loaded or an explicit
/// `--app`/`--func` override names the wrong kind of binding.
pub fn load_app<L: SourceLoader>(
    loader: &L,
    state: &ResolutionState,
) -> Result<Option<CommandApp>, HostError> {
    let namespace = loader.load(state)?;
    debug!(
        "Discovering application in {} ({} bindings)",
        namespace.name,
        namespace.len()
    );
    Ok(discover::discover(
        namespace,
        state.app_name(),
        state.func_name(),
    )?)
}
