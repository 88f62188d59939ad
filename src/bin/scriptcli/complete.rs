use std::process::ExitCode;

use log::debug;

use scriptcli::completion::{self, COMPLETE_BASH, COMPLETE_VAR};
use scriptcli::host::{HostError, HostGroup};
use scriptcli::loader::FsLoader;
use scriptcli::state::ResolutionState;

/// Words sent by the bash hook
pub struct CompletionRequest {
    args: Vec<String>,
    incomplete: String,
}

/// Read the completion request from the environment, if the hook sent one
pub fn request() -> Option<CompletionRequest> {
    let mode = std::env::var(COMPLETE_VAR).ok()?;
    if mode != COMPLETE_BASH {
        debug!("Unsupported completion mode: {mode}");
        return None;
    }
    let words = std::env::var("COMP_WORDS").unwrap_or_default();
    let cword = std::env::var("COMP_CWORD")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);
    let (args, incomplete) = completion::split_words(&words, cword);
    Some(CompletionRequest { args, incomplete })
}

/// Print one candidate per line.
///
/// # Errors
///
/// Returns `HostError` if the script named on the command line cannot be loaded.
pub fn run(
    host: &mut HostGroup<FsLoader>,
    state: &mut ResolutionState,
    request: &CompletionRequest,
) -> Result<ExitCode, HostError> {
    let choices = host.get_choices(state, &request.args, &request.incomplete)?;
    for (value, _help) in choices {
        println!("{value}");
    }
    Ok(ExitCode::SUCCESS)
}
